/// One example in sparse form: parallel arrays of values and 0-based
/// feature indexes, plus a field index per entry when the model is
/// field-aware. All three arrays always have equal length when `field`
/// is populated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseRow {
    pub x: Vec<f32>,
    pub idx: Vec<u32>,
    pub field: Vec<u32>,
}

impl SparseRow {
    pub fn new() -> SparseRow {
        SparseRow::default()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Truncates or extends the parallel arrays, zero-filling new slots.
    pub fn resize(&mut self, len: usize, with_field: bool) {
        self.x.resize(len, 0.0);
        self.idx.resize(len, 0);
        if with_field {
            self.field.resize(len, 0);
        } else {
            self.field.clear();
        }
    }

    /// Copies another row's content, reusing this row's allocations.
    pub fn copy_from(&mut self, other: &SparseRow) {
        self.x.clone_from(&other.x);
        self.idx.clone_from(&other.idx);
        self.field.clone_from(&other.field);
    }
}

/// A batch of rows with their labels. The backing arrays never shrink;
/// `row_count` tracks how many leading rows are active, so a reader can
/// reuse one batch across sampling calls without reallocating.
///
/// Labels are canonically +1.0 / -1.0 by the time they land here.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    rows: Vec<SparseRow>,
    labels: Vec<f32>,
    row_count: usize,
}

impl Batch {
    pub fn new() -> Batch {
        Batch::default()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows[..self.row_count]
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels[..self.row_count]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut SparseRow {
        assert!(i < self.row_count);
        &mut self.rows[i]
    }

    pub fn set_label(&mut self, i: usize, label: f32) {
        assert!(i < self.row_count);
        self.labels[i] = label;
    }

    /// Changes the active row count. Growing allocates rows as needed;
    /// shrinking only moves the watermark and keeps row allocations alive.
    pub fn resize(&mut self, row_count: usize) {
        if row_count > self.rows.len() {
            self.rows.resize_with(row_count, SparseRow::new);
            self.labels.resize(row_count, 0.0);
        }
        self.row_count = row_count;
    }
}

/// Sparse gradient of one batch: (position, value) pairs for the
/// bias/linear segment and for the latent segment, in parallel arrays.
/// The Vecs keep their capacity across `clear()`, so the active counts
/// are just the lengths and growth doubles on overflow.
#[derive(Clone, Debug, Default)]
pub struct SparseGrad {
    pub pos_w: Vec<usize>,
    pub w: Vec<f32>,
    pub pos_v: Vec<usize>,
    pub v: Vec<f32>,
}

impl SparseGrad {
    pub fn new() -> SparseGrad {
        SparseGrad::default()
    }

    pub fn clear(&mut self) {
        self.pos_w.clear();
        self.w.clear();
        self.pos_v.clear();
        self.v.clear();
    }

    #[inline(always)]
    pub fn push_linear(&mut self, pos: usize, val: f32) {
        self.pos_w.push(pos);
        self.w.push(val);
    }

    #[inline(always)]
    pub fn push_latent(&mut self, pos: usize, val: f32) {
        self.pos_v.push(pos);
        self.v.push(val);
    }

    pub fn size_w(&self) -> usize {
        self.pos_w.len()
    }

    pub fn size_v(&self) -> usize {
        self.pos_v.len()
    }
}
