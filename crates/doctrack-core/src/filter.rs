use serde_json::Value;

/// Optional bounds on a change's old (`from`) and new (`to`) values
///
/// An absent side matches any value, so `ChangeFilter::any()` turns every
/// filtered query into a plain dirty check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeFilter {
    from: Option<Value>,
    to: Option<Value>,
}

impl ChangeFilter {
    /// Filter that matches every change
    pub fn any() -> Self {
        Self::default()
    }

    /// Require the old value to equal `value`
    pub fn with_from(mut self, value: Value) -> Self {
        self.from = Some(value);
        self
    }

    /// Require the new value to equal `value`
    pub fn with_to(mut self, value: Value) -> Self {
        self.to = Some(value);
        self
    }

    /// Shorthand for both bounds
    pub fn between(from: Value, to: Value) -> Self {
        Self::any().with_from(from).with_to(to)
    }

    pub fn from_value(&self) -> Option<&Value> {
        self.from.as_ref()
    }

    pub fn to_value(&self) -> Option<&Value> {
        self.to.as_ref()
    }

    pub fn is_any(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check both sides independently
    pub fn matches(&self, old: &Value, new: &Value) -> bool {
        self.from.as_ref().map_or(true, |from| from == old)
            && self.to.as_ref().map_or(true, |to| to == new)
    }
}
