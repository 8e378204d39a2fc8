use crate::error::{LuxError, Result};

/// Output-shape template of a column block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    Scalar,
    FixedVector(usize),
    /// Length known only once the engine has returned.
    Variable,
}

impl BlockShape {
    /// Whether an engine block of `len` components fits this template.
    pub fn accepts(self, len: usize) -> bool {
        match self {
            BlockShape::Scalar => len == 1,
            BlockShape::FixedVector(n) => len == n,
            BlockShape::Variable => true,
        }
    }
}

/// Column label generator for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Labels {
    /// Exactly these names.
    Fixed(&'static [&'static str]),
    /// `{prefix}1 ..= {prefix}n` for whatever `n` the engine produced.
    Indexed(&'static str),
}

impl Labels {
    pub fn shape(&self) -> BlockShape {
        match self {
            Labels::Fixed(names) if names.len() == 1 => BlockShape::Scalar,
            Labels::Fixed(names) => BlockShape::FixedVector(names.len()),
            Labels::Indexed(_) => BlockShape::Variable,
        }
    }

    /// Labels for a block of `len` components.
    ///
    /// A block whose length does not fit its shape is an engine fault and
    /// fails with `DomainComputation`.
    pub fn generate(&self, len: usize) -> Result<Vec<String>> {
        let shape = self.shape();
        match self {
            Labels::Fixed(names) if !shape.accepts(len) => Err(LuxError::DomainComputation(
                format!(
                    "expected {} values for [{}], engine returned {len}",
                    names.len(),
                    names.join(", ")
                ),
            )),
            Labels::Fixed(names) => Ok(names.iter().map(|n| n.to_string()).collect()),
            Labels::Indexed(prefix) => Ok((1..=len).map(|i| format!("{prefix}{i}")).collect()),
        }
    }
}
