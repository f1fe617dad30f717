use regex::Regex;

/// Recursive description of a value's expected structure.
///
/// Shapes are built once at registration time and are immutable afterwards;
/// the registry hands them out behind `Arc<RouteSpec>` for unsynchronized
/// concurrent reads.
#[derive(Debug, Clone)]
pub enum Shape {
    /// UTF-8 string, optionally constrained by length and pattern.
    String(StringRules),
    /// 64-bit signed integer, optionally range-constrained.
    Integer(IntegerRules),
    Boolean,
    /// Value may be absent or null ("not provided").
    Optional(Box<Shape>),
    /// Ordered sequence of a single item shape.
    Sequence(Box<Shape>),
    /// Fixed record of named fields.
    Record(Vec<Field>),
}

impl Shape {
    #[must_use]
    pub fn string() -> Self {
        Shape::String(StringRules::default())
    }

    #[must_use]
    pub fn integer() -> Self {
        Shape::Integer(IntegerRules::default())
    }

    #[must_use]
    pub fn boolean() -> Self {
        Shape::Boolean
    }

    #[must_use]
    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn sequence(item: Shape) -> Self {
        Shape::Sequence(Box::new(item))
    }

    #[must_use]
    pub fn record(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Record(fields.into_iter().collect())
    }

    /// Human-readable name of the structural kind, used in parse errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::String(_) => "string",
            Shape::Integer(_) => "integer",
            Shape::Boolean => "boolean",
            Shape::Optional(inner) => inner.kind_name(),
            Shape::Sequence(_) => "sequence",
            Shape::Record(_) => "record",
        }
    }

    /// Whether absence / null is acceptable for this shape.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Shape::Optional(_))
    }
}

/// Domain constraints on an integer shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerRules {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntegerRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

/// Domain constraints on a string shape.
///
/// The pattern is compiled once when the rules are built, never per request.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub pattern: Option<Regex>,
}

impl StringRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    #[must_use]
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

/// Named field of a record shape, with an optional human-readable description
/// carried through to generated client bindings.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub description: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            description: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
