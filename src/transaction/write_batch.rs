use crate::util::Slice;

/// Write operation type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: Slice, value: Slice },
    Delete { key: Slice },
}

impl WriteOp {
    pub fn key(&self) -> &Slice {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// WriteBatch accumulates multiple write operations for atomic execution.
///
/// The store assigns the batch a contiguous run of sequence numbers and
/// publishes them together, so a snapshot observes either every operation
/// of the batch or none of them.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    /// Operations in insertion order
    ops: Vec<WriteOp>,
    /// Approximate memory usage in bytes
    data_size: usize,
}

impl WriteBatch {
    /// Create a new empty WriteBatch
    #[inline]
    pub fn new() -> Self {
        WriteBatch {
            ops: Vec::new(),
            data_size: 0,
        }
    }

    /// Create WriteBatch with reserved capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        WriteBatch {
            ops: Vec::with_capacity(capacity),
            data_size: 0,
        }
    }

    /// Add a Put operation to the batch
    pub fn put(&mut self, key: impl Into<Slice>, value: impl Into<Slice>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        self.data_size += key.size() + value.size();
        self.ops.push(WriteOp::Put { key, value });
        self
    }

    /// Add a Delete operation to the batch
    pub fn delete(&mut self, key: impl Into<Slice>) -> &mut Self {
        let key = key.into();
        self.data_size += key.size();
        self.ops.push(WriteOp::Delete { key });
        self
    }

    /// Get all operations
    #[inline]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of operations in the batch
    #[inline]
    pub fn count(&self) -> usize {
        self.ops.len()
    }

    /// Clear all operations
    pub fn clear(&mut self) {
        self.ops.clear();
        self.data_size = 0;
    }

    /// Approximate memory usage in bytes
    #[inline]
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Check if batch is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
