use clap::{App, Arg};

pub fn parse<'a>() -> clap::ArgMatches<'a> {
    create_parser().get_matches()
}

pub fn create_parser<'a, 'b>() -> App<'a, 'b> {
    App::new("sfm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Trains sparse linear models: logistic regression, FM and FFM")
        .arg(
            Arg::with_name("data")
                .short("d")
                .long("data")
                .value_name("filename")
                .help("Input file, one tab-separated example per line (.gz and .zst are decompressed on the fly)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("model")
                .short("m")
                .long("model")
                .value_name("lr|fm|ffm")
                .help("Model kind to train (default: lr)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("feature_num")
                .long("feature_num")
                .value_name("N")
                .help("Number of distinct features; indexes in the data must be below this")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("field_num")
                .long("field_num")
                .value_name("N")
                .help("Number of fields (ffm only)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("k")
                .short("k")
                .long("k")
                .value_name("N")
                .help("Latent vector size for fm/ffm (default: 4)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("learning_rate")
                .short("l")
                .long("learning_rate")
                .value_name("lr")
                .help("Base learning rate (default: 0.2)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("lambda")
                .long("lambda")
                .value_name("lambda")
                .help("Regularization strength (default: 0.0)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("regularizer")
                .long("regularizer")
                .value_name("none|l1|l2")
                .help("Regularization kind (default: none)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("optimizer")
                .long("optimizer")
                .value_name("sgd|adagrad")
                .help("Parameter update rule (default: sgd)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ada_eta")
                .long("ada_eta")
                .value_name("eta")
                .help("Adagrad step size; defaults to the base learning rate")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ada_epsilon")
                .long("ada_epsilon")
                .value_name("eps")
                .help("Initial adagrad accumulator value (default: 1e-8)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("init_gaussian")
                .long("init_gaussian")
                .help("Draw every parameter from the gaussian initializer, not just latent vectors"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("N")
                .help("Seed for parameter initialization (default: 0)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("batch_size")
                .short("b")
                .long("batch_size")
                .value_name("N")
                .help("Examples per gradient step; 1 is plain SGD (default: 64)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("iterations")
                .short("n")
                .long("iterations")
                .value_name("N")
                .help("Number of batch updates to run (default: 1000)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("eval_every")
                .long("eval_every")
                .value_name("N")
                .help("Log the training log-loss every N iterations, 0 to disable (default: 100)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("in_memory")
                .long("in_memory")
                .help("Parse the whole input once up front and sample batches from memory"),
        )
        .arg(
            Arg::with_name("testonly")
                .short("t")
                .long("testonly")
                .help("Ignore label information and just test, scanning the input once"),
        )
        .arg(
            Arg::with_name("initial_model")
                .short("i")
                .long("initial_model")
                .value_name("filename")
                .help("Binary checkpoint to start from; shape must match the configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("final_model")
                .short("f")
                .long("final_model")
                .value_name("filename")
                .help("Where to save the trained model checkpoint")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("dump_json")
                .long("dump_json")
                .value_name("filename")
                .help("Also write a human-readable JSON dump of the model")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("predictions")
                .short("p")
                .long("predictions")
                .value_name("filename")
                .help("File to write one prediction per input row")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("predictions_stdout")
                .long("predictions_stdout")
                .help("Output predictions to stdout"),
        )
}
