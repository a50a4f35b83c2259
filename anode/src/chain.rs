use crate::ContainerError;

/// Identifiers currently being resolved within one top-level lookup.
///
/// Every recursive resolution pushes its identifier before descending and pops
/// it afterwards, whether or not the resolution succeeded. Pushing an identifier
/// that is already present fails with [`ContainerError::CircularReference`]
/// instead of recursing further.
#[derive(Clone, Debug, Default)]
pub struct DependencyChain {
    ids: Vec<String>,
}

impl DependencyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|v| v == id)
    }

    pub fn push(&mut self, id: &str) -> Result<(), ContainerError> {
        if self.contains(id) {
            let mut chain = self.ids.clone();
            chain.push(id.to_owned());
            tracing::debug!(chain = ?chain, "Circular reference detected");
            return Err(ContainerError::CircularReference { chain });
        }
        self.ids.push(id.to_owned());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<String> {
        self.ids.pop()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
