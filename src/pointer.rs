//! # Field Pointers
//!
//! A compiled step knows its position in the schema tree as a template of
//! fixed keys and array-index slots. At run time the template renders to a
//! concrete dotted pointer (`users.0.username`); at compile time it renders
//! to the wildcard form (`users.*.username`) used to match message overrides
//! across all elements of an array.

/// One segment of a field path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed object key.
    Key(String),
    /// Array index, filled in from the live index stack.
    Index,
}

/// Path template from the root to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Empty path at the input root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with a fixed key segment.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        FieldPath { segments }
    }

    /// Extend with an array-index segment.
    pub fn element(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index);
        FieldPath { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the concrete pointer for one input, taking array indices from
    /// `indices` in path order.
    pub fn render(&self, indices: &[usize]) -> String {
        let mut next = indices.iter();
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Key(key) => key.clone(),
                Segment::Index => next
                    .next()
                    .map(|index| index.to_string())
                    .unwrap_or_else(|| "*".to_string()),
            })
            .collect();
        parts.join(".")
    }

    /// Wildcard form, present only when the path crosses an array.
    pub fn wildcard(&self) -> Option<String> {
        if !self.segments.iter().any(|s| matches!(s, Segment::Index)) {
            return None;
        }
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Key(key) => key.as_str(),
                Segment::Index => "*",
            })
            .collect();
        Some(parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_plain_keys() {
        let path = FieldPath::root().child("profile").child("name");
        assert_eq!(path.render(&[]), "profile.name");
        assert_eq!(path.wildcard(), None);
    }

    #[test]
    fn test_renders_array_indices_in_order() {
        let path = FieldPath::root().child("users").element().child("username");
        assert_eq!(path.render(&[0]), "users.0.username");
        assert_eq!(path.render(&[7]), "users.7.username");
    }

    #[test]
    fn test_nested_arrays_consume_indices_outermost_first() {
        let path = FieldPath::root().child("matrix").element().element();
        assert_eq!(path.render(&[2, 5]), "matrix.2.5");
    }

    #[test]
    fn test_wildcard_substitutes_every_index() {
        let path = FieldPath::root().child("users").element().child("username");
        assert_eq!(path.wildcard().as_deref(), Some("users.*.username"));

        let nested = FieldPath::root().child("matrix").element().element();
        assert_eq!(nested.wildcard().as_deref(), Some("matrix.*.*"));
    }

    #[test]
    fn test_root_path_is_empty() {
        assert!(FieldPath::root().is_root());
        assert_eq!(FieldPath::root().render(&[]), "");
    }
}
