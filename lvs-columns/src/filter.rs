use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::column::Row;
use crate::error::ColumnError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
/// The comparison operators accepted in `Filter:` headers.
pub enum RelationalOperator {
    Equal,
    NotEqual,
    Matches,
    DoesntMatch,
    EqualIcase,
    NotEqualIcase,
    MatchesIcase,
    DoesntMatchIcase,
    Less,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
}

impl RelationalOperator {
    pub const ALL: [RelationalOperator; 12] = [
        Self::Equal,
        Self::NotEqual,
        Self::Matches,
        Self::DoesntMatch,
        Self::EqualIcase,
        Self::NotEqualIcase,
        Self::MatchesIcase,
        Self::DoesntMatchIcase,
        Self::Less,
        Self::GreaterOrEqual,
        Self::Greater,
        Self::LessOrEqual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Matches => "~",
            Self::DoesntMatch => "!~",
            Self::EqualIcase => "=~",
            Self::NotEqualIcase => "!=~",
            Self::MatchesIcase => "~~",
            Self::DoesntMatchIcase => "!~~",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
        }
    }

    /// Returns the operator accepting exactly the rows this one rejects.
    pub fn negate(self) -> Self {
        match self {
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::Matches => Self::DoesntMatch,
            Self::DoesntMatch => Self::Matches,
            Self::EqualIcase => Self::NotEqualIcase,
            Self::NotEqualIcase => Self::EqualIcase,
            Self::MatchesIcase => Self::DoesntMatchIcase,
            Self::DoesntMatchIcase => Self::MatchesIcase,
            Self::Less => Self::GreaterOrEqual,
            Self::GreaterOrEqual => Self::Less,
            Self::Greater => Self::LessOrEqual,
            Self::LessOrEqual => Self::Greater,
        }
    }
}

impl Display for RelationalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("invalid relational operator '{0}'")]
pub struct ParseOperatorError(String);

impl FromStr for RelationalOperator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(op) = Self::ALL.into_iter().find(|op| op.as_str() == s) {
            return Ok(op);
        }

        // Negated comparison spellings.
        match s {
            "!<" => Ok(Self::GreaterOrEqual),
            "!>=" => Ok(Self::Less),
            "!>" => Ok(Self::LessOrEqual),
            "!<=" => Ok(Self::Greater),
            _ => Err(ParseOperatorError(s.to_string())),
        }
    }
}

/// A predicate evaluated against rows during selection.
pub trait Filter: Send + Sync {
    /// The name of the column the predicate reads.
    fn column_name(&self) -> &str;

    fn accepts(&self, row: &Row<'_>) -> Result<bool, ColumnError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("=", RelationalOperator::Equal)]
    #[case("!=~", RelationalOperator::NotEqualIcase)]
    #[case("~~", RelationalOperator::MatchesIcase)]
    #[case(">=", RelationalOperator::GreaterOrEqual)]
    #[case("!<", RelationalOperator::GreaterOrEqual)]
    #[case("!>=", RelationalOperator::Less)]
    #[case("!>", RelationalOperator::LessOrEqual)]
    #[case("!<=", RelationalOperator::Greater)]
    fn test_parse_operator(#[case] input: &str, #[case] expected: RelationalOperator) {
        assert_eq!(input.parse::<RelationalOperator>(), Ok(expected));
    }

    #[test]
    fn test_parse_unknown_operator() {
        let err = "=>".parse::<RelationalOperator>().unwrap_err();
        assert_eq!(err.to_string(), "invalid relational operator '=>'");
    }

    #[test]
    fn test_negate_is_involution() {
        for op in RelationalOperator::ALL {
            assert_ne!(op.negate(), op);
            assert_eq!(op.negate().negate(), op);
        }
    }
}
