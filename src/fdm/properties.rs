use std::collections::BTreeMap;

/// Flat property tree keyed by slash-separated paths
#[derive(Debug, Clone, Default)]
pub struct PropertyTree {
    values: BTreeMap<String, f64>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value or 0.0 for unset nodes
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        match self.values.get_mut(name) {
            Some(v) => *v = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut props = PropertyTree::new();
        assert_eq!(props.get("ap/active-waypoint"), None);
        assert_eq!(props.value("ap/active-waypoint"), 0.0);

        props.set("ap/active-waypoint", 3.0);
        props.set("ap/active-waypoint", 4.0);
        assert_eq!(props.get("ap/active-waypoint"), Some(4.0));
        assert_eq!(props.len(), 1);
    }
}
