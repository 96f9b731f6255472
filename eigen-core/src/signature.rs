use std::fmt;

/// The access level of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Callable from anywhere.
    Public,
    /// Callable only when the caller is an instance of the method's holder.
    Protected,
    /// Callable only when the caller is the receiver itself.
    Private,
}

impl Visibility {
    /// Parse a visibility from its keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    /// The keyword for this visibility.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The number of arguments a method accepts (the receiver is never counted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// At least this many arguments.
    AtLeast(usize),
    /// Between these bounds (inclusive).
    Between(usize, usize),
}

impl Arity {
    /// Whether a call with `count` arguments is acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => (min..=max).contains(&count),
        }
    }

    /// The minimum number of arguments required.
    pub fn required(&self) -> usize {
        match *self {
            Self::Exact(n) | Self::AtLeast(n) | Self::Between(n, _) => n,
        }
    }

    /// The conventional signed encoding: `n` for fixed arities,
    /// `-(required + 1)` when optional arguments are accepted.
    pub fn as_signed(&self) -> i64 {
        match *self {
            Self::Exact(n) => n as i64,
            Self::AtLeast(_) | Self::Between(..) => -(self.required() as i64) - 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::AtLeast(n) => write!(f, "{}+", n),
            Self::Between(min, max) => write!(f, "{}..{}", min, max),
        }
    }
}
