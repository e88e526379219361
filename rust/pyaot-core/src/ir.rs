//! Typed intermediate representation.
//!
//! The IR is a closed set of immutable variants produced by the translator and
//! consumed read-only by the native lowering pass. Binary operations over two
//! literals never appear: [`IrNode::binary`] folds them on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Fixed-width integer types. The source spelling is `int8` .. `int64`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum IntegerType {
    #[strum(serialize = "int8")]
    I8,
    #[strum(serialize = "int16")]
    I16,
    #[strum(serialize = "int32")]
    I32,
    #[strum(serialize = "int64")]
    I64,
}

impl IntegerType {
    /// Type used when nothing else constrains a value; also the address width of `poke`.
    pub const WIDEST: IntegerType = IntegerType::I64;

    pub fn bits(self) -> u32 {
        match self {
            IntegerType::I8 => 8,
            IntegerType::I16 => 16,
            IntegerType::I32 => 32,
            IntegerType::I64 => 64,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(IntegerType::I8),
            16 => Some(IntegerType::I16),
            32 => Some(IntegerType::I32),
            64 => Some(IntegerType::I64),
            _ => None,
        }
    }

    /// Parse a source annotation such as `int32`.
    pub fn from_annotation(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Whether `value` is representable in this width, as either a signed or
    /// an unsigned quantity.
    pub fn fits(self, value: i64) -> bool {
        let bits = self.bits();
        if bits == 64 {
            return true;
        }
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << bits) - 1;
        (min..=max).contains(&value)
    }

    /// The low `bits` of `value`, zero-extended.
    pub fn truncate(self, value: i64) -> i64 {
        match self.bits() {
            64 => value,
            bits => value & ((1i64 << bits) - 1),
        }
    }
}

/// Declared result of a function: an integer type or the `None` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnType {
    Int(IntegerType),
    NoReturn,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Int(ty) => write!(f, "{ty}"),
            ReturnType::NoReturn => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[strum(serialize = "add")]
    Add,
    #[strum(serialize = "multiply")]
    Multiply,
}

impl BinaryOperator {
    /// Evaluate on two constants with 64-bit wrap-around, matching the
    /// instruction the backend would emit.
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            BinaryOperator::Add => lhs.wrapping_add(rhs),
            BinaryOperator::Multiply => lhs.wrapping_mul(rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: IntegerType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<IrNode>,
    pub return_type: ReturnType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<IrNode>,
}

impl Module {
    /// Function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|node| match node {
            IrNode::FunctionDef(def) => Some(def),
            _ => None,
        })
    }

    /// Serialize the module as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrNode {
    Module(Module),
    FunctionDef(FunctionDef),
    Variable {
        name: String,
        ty: Option<IntegerType>,
    },
    IntegerLiteral {
        value: i64,
        ty: Option<IntegerType>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<IrNode>,
        right: Box<IrNode>,
    },
    Poke {
        address: Box<IrNode>,
        value: Box<IrNode>,
        ty: IntegerType,
    },
    Call {
        callee: String,
        args: Vec<IrNode>,
    },
    Return {
        value: Option<Box<IrNode>>,
    },
    /// Declaration marker; the members live in the constant table.
    EnumDecl {
        name: String,
    },
    /// Declaration marker; the value lives in the constant table.
    ConstDecl {
        name: String,
    },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    #[error("type mismatch: {left} literal combined with {right} literal")]
    TypeMismatch { left: IntegerType, right: IntegerType },
}

impl IrNode {
    /// An untyped integer literal.
    pub fn literal(value: i64) -> Self {
        IrNode::IntegerLiteral { value, ty: None }
    }

    /// Build a binary operation, folding it when both operands are literals.
    ///
    /// A folded literal keeps the explicit type of its operands. Two literals
    /// typed differently cannot be folded and are rejected.
    pub fn binary(op: BinaryOperator, left: IrNode, right: IrNode) -> Result<Self, FoldError> {
        match (&left, &right) {
            (
                IrNode::IntegerLiteral { value: l, ty: lt },
                IrNode::IntegerLiteral { value: r, ty: rt },
            ) => {
                let ty = match (*lt, *rt) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(FoldError::TypeMismatch { left: a, right: b })
                    }
                    (Some(a), _) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                };
                Ok(IrNode::IntegerLiteral { value: op.apply(*l, *r), ty })
            }
            _ => Ok(IrNode::BinaryOp { op, left: Box::new(left), right: Box::new(right) }),
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            IrNode::Module(_) => "module",
            IrNode::FunctionDef(_) => "function definition",
            IrNode::Variable { .. } => "variable",
            IrNode::IntegerLiteral { .. } => "integer literal",
            IrNode::BinaryOp { .. } => "binary operation",
            IrNode::Poke { .. } => "poke",
            IrNode::Call { .. } => "call",
            IrNode::Return { .. } => "return",
            IrNode::EnumDecl { .. } => "enum declaration",
            IrNode::ConstDecl { .. } => "constant declaration",
        }
    }

    pub fn as_literal(&self) -> Option<i64> {
        match self {
            IrNode::IntegerLiteral { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn var(name: &str) -> IrNode {
        IrNode::Variable { name: name.to_string(), ty: Some(IntegerType::I64) }
    }

    #[test]
    fn literal_operands_fold() {
        for (a, b) in [(0, 0), (2, 3), (-7, 6), (i64::MAX, 1)] {
            let sum =
                IrNode::binary(BinaryOperator::Add, IrNode::literal(a), IrNode::literal(b)).unwrap();
            assert_eq!(sum, IrNode::literal(a.wrapping_add(b)));
            let product =
                IrNode::binary(BinaryOperator::Multiply, IrNode::literal(a), IrNode::literal(b))
                    .unwrap();
            assert_eq!(product, IrNode::literal(a.wrapping_mul(b)));
        }
    }

    #[test]
    fn mixed_operands_do_not_fold() {
        let node = IrNode::binary(BinaryOperator::Add, var("a"), IrNode::literal(2)).unwrap();
        assert!(matches!(node, IrNode::BinaryOp { op: BinaryOperator::Add, .. }));
    }

    #[test]
    fn folding_keeps_single_explicit_type() {
        let typed = IrNode::IntegerLiteral { value: 4, ty: Some(IntegerType::I16) };
        let node = IrNode::binary(BinaryOperator::Multiply, typed, IrNode::literal(3)).unwrap();
        assert_eq!(node, IrNode::IntegerLiteral { value: 12, ty: Some(IntegerType::I16) });
    }

    #[test]
    fn folding_differently_typed_literals_fails() {
        let narrow = IrNode::IntegerLiteral { value: 1, ty: Some(IntegerType::I8) };
        let wide = IrNode::IntegerLiteral { value: 1, ty: Some(IntegerType::I16) };
        let err = IrNode::binary(BinaryOperator::Add, narrow, wide).unwrap_err();
        assert_eq!(err, FoldError::TypeMismatch { left: IntegerType::I8, right: IntegerType::I16 });
        assert!(err.to_string().starts_with("type mismatch"));
    }

    #[test]
    fn integer_type_round_trips_through_annotation() {
        for ty in IntegerType::iter() {
            assert_eq!(IntegerType::from_annotation(&ty.to_string()), Some(ty));
            assert_eq!(IntegerType::from_bits(ty.bits()), Some(ty));
        }
        assert_eq!(IntegerType::from_annotation("int"), None);
        assert_eq!(IntegerType::from_bits(7), None);
    }

    #[test]
    fn fits_accepts_signed_and_unsigned_ranges() {
        assert!(IntegerType::I8.fits(-128));
        assert!(IntegerType::I8.fits(255));
        assert!(!IntegerType::I8.fits(256));
        assert!(!IntegerType::I8.fits(-129));
        assert!(IntegerType::I64.fits(i64::MIN));
    }

    #[test]
    fn truncate_masks_low_bits() {
        assert_eq!(IntegerType::I8.truncate(-1), 0xff);
        assert_eq!(IntegerType::I16.truncate(0x1_2345), 0x2345);
        assert_eq!(IntegerType::I64.truncate(-1), -1);
    }

    #[test]
    fn module_lists_functions_in_order() {
        let f = |name: &str| {
            IrNode::FunctionDef(FunctionDef {
                name: name.to_string(),
                params: vec![],
                body: vec![],
                return_type: ReturnType::NoReturn,
            })
        };
        let module = Module {
            body: vec![f("a"), IrNode::ConstDecl { name: "K".into() }, f("b")],
        };
        let names: Vec<_> = module.functions().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
