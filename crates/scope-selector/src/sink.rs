//! Consumers of confirmed targeting descriptors.

use scope_state::TargetingDescriptor;

/// Receives the descriptor produced by a successful confirmation.
///
/// Mapping the descriptor onto a persistence payload is the consumer's
/// concern; the selector hands over the value and keeps nothing.
pub trait DescriptorSink {
    fn emit(&mut self, descriptor: &TargetingDescriptor);
}

/// Keeps every emitted descriptor, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    emitted: Vec<TargetingDescriptor>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> &[TargetingDescriptor] {
        &self.emitted
    }

    pub fn last(&self) -> Option<&TargetingDescriptor> {
        self.emitted.last()
    }
}

impl DescriptorSink for CollectingSink {
    fn emit(&mut self, descriptor: &TargetingDescriptor) {
        self.emitted.push(descriptor.clone());
    }
}

impl<S: DescriptorSink + ?Sized> DescriptorSink for &mut S {
    fn emit(&mut self, descriptor: &TargetingDescriptor) {
        (**self).emit(descriptor);
    }
}

impl<S: DescriptorSink + ?Sized> DescriptorSink for Box<S> {
    fn emit(&mut self, descriptor: &TargetingDescriptor) {
        (**self).emit(descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_twice<S: DescriptorSink>(mut sink: S) {
        sink.emit(&TargetingDescriptor::Global);
        sink.emit(&TargetingDescriptor::Global);
    }

    #[test]
    fn collects_through_borrow() {
        let mut sink = CollectingSink::new();
        emit_twice(&mut sink);
        assert_eq!(sink.emitted().len(), 2);
        assert_eq!(sink.last(), Some(&TargetingDescriptor::Global));
    }
}
