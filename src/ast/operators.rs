/// Binary operators.
///
/// Word and symbol spellings of the same operator (`and`/`&&`, `or`/`||`)
/// share a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Logical
    /// `or`, `||`
    Or,
    /// `xor`
    Xor,
    /// `and`, `&&`
    And,

    // Bitwise
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    // Comparison
    /// `==`
    Equal,
    /// `===`
    Identical,
    /// `!=`
    NotEqual,
    /// `!==`
    NotIdentical,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `not in`
    NotIn,
    /// `in`
    In,
    /// `matches`
    Matches,
    /// `contains`
    Contains,
    /// `starts with`
    StartsWith,
    /// `ends with`
    EndsWith,

    // Arithmetic
    /// `..`
    Range,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `~`
    Concat,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `**`
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOperator::*;
        let op = match symbol {
            "or" | "||" => Or,
            "xor" => Xor,
            "and" | "&&" => And,
            "|" => BitOr,
            "^" => BitXor,
            "&" => BitAnd,
            "<<" => ShiftLeft,
            ">>" => ShiftRight,
            "==" => Equal,
            "===" => Identical,
            "!=" => NotEqual,
            "!==" => NotIdentical,
            "<" => Less,
            ">" => Greater,
            ">=" => GreaterEqual,
            "<=" => LessEqual,
            "not in" => NotIn,
            "in" => In,
            "matches" => Matches,
            "contains" => Contains,
            "starts with" => StartsWith,
            "ends with" => EndsWith,
            ".." => Range,
            "+" => Add,
            "-" => Subtract,
            "~" => Concat,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulo,
            "**" => Power,
            _ => return None,
        };
        Some(op)
    }

    /// Spelling in expression source.
    pub fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Or => "or",
            Xor => "xor",
            And => "and",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Equal => "==",
            Identical => "===",
            NotEqual => "!=",
            NotIdentical => "!==",
            Less => "<",
            Greater => ">",
            GreaterEqual => ">=",
            LessEqual => "<=",
            NotIn => "not in",
            In => "in",
            Matches => "matches",
            Contains => "contains",
            StartsWith => "starts with",
            EndsWith => "ends with",
            Range => "..",
            Add => "+",
            Subtract => "-",
            Concat => "~",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Power => "**",
        }
    }

    pub fn precedence(self) -> u16 {
        use BinaryOperator::*;
        match self {
            Or => 10,
            Xor => 12,
            And => 15,
            BitOr => 16,
            BitXor => 17,
            BitAnd => 18,
            Equal | Identical | NotEqual | NotIdentical | Less | Greater | GreaterEqual
            | LessEqual | NotIn | In | Matches | Contains | StartsWith | EndsWith => 20,
            Range | ShiftLeft | ShiftRight => 25,
            Add | Subtract => 30,
            Concat => 40,
            Multiply | Divide | Modulo => 60,
            Power => 200,
        }
    }

    pub fn associativity(self) -> Associativity {
        match self {
            BinaryOperator::Power => Associativity::Right,
            _ => Associativity::Left,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `not`, `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "not" | "!" => Some(UnaryOperator::Not),
            "-" => Some(UnaryOperator::Negate),
            "+" => Some(UnaryOperator::Plus),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }

    pub fn precedence(self) -> u16 {
        match self {
            UnaryOperator::Not => 50,
            UnaryOperator::Negate | UnaryOperator::Plus => 500,
        }
    }
}
