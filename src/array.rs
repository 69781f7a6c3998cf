//! Typed N-dimensional buffers exchanged with the file readers and writers
//!
//! [`ArrayValue`] holds a fully materialized array of any rank together with
//! its element type, and [`VarType`] names the storage type a variable is
//! declared with on disk. Besides the numeric types, variables may hold
//! single characters (`char`) or variable-length strings.

use crate::errors::{NcUtilsError, Result};
use ndarray::{arr0, Array, ArrayD, Dimension};
use std::fmt;
use std::str::FromStr;

/// Storage type of a variable, parsed from a type code such as `"f8"` or `"int"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Int64,
    UInt64,
    Float,
    Double,
    Char,
    String,
}

impl VarType {
    /// Canonical type code, e.g. `"f8"`.
    pub fn code(&self) -> &'static str {
        match self {
            VarType::Byte => "i1",
            VarType::UByte => "u1",
            VarType::Short => "i2",
            VarType::UShort => "u2",
            VarType::Int => "i4",
            VarType::UInt => "u4",
            VarType::Int64 => "i8",
            VarType::UInt64 => "u8",
            VarType::Float => "f4",
            VarType::Double => "f8",
            VarType::Char => "S1",
            VarType::String => "str",
        }
    }

    /// Whether values of this type are text rather than numbers.
    pub fn is_text(&self) -> bool {
        matches!(self, VarType::Char | VarType::String)
    }

    /// Whether the type can be stored in a classic-format file.
    pub fn is_classic(&self) -> bool {
        matches!(
            self,
            VarType::Byte
                | VarType::Short
                | VarType::Int
                | VarType::Float
                | VarType::Double
                | VarType::Char
        )
    }
}

impl FromStr for VarType {
    type Err = NcUtilsError;

    fn from_str(s: &str) -> Result<Self> {
        // "float" and "f" are 64-bit
        let var_type = match s.trim() {
            "i1" | "b" | "int8" | "byte" => VarType::Byte,
            "u1" | "B" | "uint8" | "ubyte" => VarType::UByte,
            "i2" | "h" | "int16" | "short" => VarType::Short,
            "u2" | "H" | "uint16" | "ushort" => VarType::UShort,
            "i4" | "i" | "int32" | "int" => VarType::Int,
            "u4" | "I" | "uint32" | "uint" => VarType::UInt,
            "i8" | "q" | "int64" | "long" => VarType::Int64,
            "u8" | "Q" | "uint64" | "ulong" => VarType::UInt64,
            "f4" | "float32" | "single" => VarType::Float,
            "f8" | "f" | "d" | "float" | "float64" | "double" => VarType::Double,
            "S1" | "c" | "char" => VarType::Char,
            "str" | "string" => VarType::String,
            other => return Err(NcUtilsError::InvalidVarType(other.to_string())),
        };
        Ok(var_type)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A materialized array of any rank with its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    I8(ArrayD<i8>),
    U8(ArrayD<u8>),
    I16(ArrayD<i16>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    U32(ArrayD<u32>),
    I64(ArrayD<i64>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    /// Raw bytes of a `char` variable, one per element
    Char(ArrayD<u8>),
    Str(ArrayD<String>),
}

/// Applies `$body` to the inner array of every variant.
macro_rules! with_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            $crate::array::ArrayValue::I8($arr) => $body,
            $crate::array::ArrayValue::U8($arr) => $body,
            $crate::array::ArrayValue::I16($arr) => $body,
            $crate::array::ArrayValue::U16($arr) => $body,
            $crate::array::ArrayValue::I32($arr) => $body,
            $crate::array::ArrayValue::U32($arr) => $body,
            $crate::array::ArrayValue::I64($arr) => $body,
            $crate::array::ArrayValue::U64($arr) => $body,
            $crate::array::ArrayValue::F32($arr) => $body,
            $crate::array::ArrayValue::F64($arr) => $body,
            $crate::array::ArrayValue::Char($arr) => $body,
            $crate::array::ArrayValue::Str($arr) => $body,
        }
    };
}

/// Applies `$body` to numeric arrays and evaluates `$text` for text variants.
macro_rules! with_numeric {
    ($value:expr, $arr:ident => $body:expr, _ => $text:expr) => {
        match $value {
            $crate::array::ArrayValue::I8($arr) => $body,
            $crate::array::ArrayValue::U8($arr) => $body,
            $crate::array::ArrayValue::I16($arr) => $body,
            $crate::array::ArrayValue::U16($arr) => $body,
            $crate::array::ArrayValue::I32($arr) => $body,
            $crate::array::ArrayValue::U32($arr) => $body,
            $crate::array::ArrayValue::I64($arr) => $body,
            $crate::array::ArrayValue::U64($arr) => $body,
            $crate::array::ArrayValue::F32($arr) => $body,
            $crate::array::ArrayValue::F64($arr) => $body,
            $crate::array::ArrayValue::Char(_) | $crate::array::ArrayValue::Str(_) => $text,
        }
    };
}
pub(crate) use with_numeric;

impl ArrayValue {
    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        with_array!(self, a => a.ndim())
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type matching the element type.
    pub fn var_type(&self) -> VarType {
        match self {
            ArrayValue::I8(_) => VarType::Byte,
            ArrayValue::U8(_) => VarType::UByte,
            ArrayValue::I16(_) => VarType::Short,
            ArrayValue::U16(_) => VarType::UShort,
            ArrayValue::I32(_) => VarType::Int,
            ArrayValue::U32(_) => VarType::UInt,
            ArrayValue::I64(_) => VarType::Int64,
            ArrayValue::U64(_) => VarType::UInt64,
            ArrayValue::F32(_) => VarType::Float,
            ArrayValue::F64(_) => VarType::Double,
            ArrayValue::Char(_) => VarType::Char,
            ArrayValue::Str(_) => VarType::String,
        }
    }

    /// Lossy conversion of every element to `f64`; `None` for text.
    pub fn to_f64(&self) -> Option<ArrayD<f64>> {
        with_numeric!(self, a => Some(a.mapv(|x| x as f64)), _ => None)
    }

    /// Converts every element to the given storage type with `as` semantics.
    ///
    /// Returns `None` when text would have to become numbers or the reverse.
    pub fn cast(&self, var_type: VarType) -> Option<ArrayValue> {
        if self.var_type() == var_type {
            return Some(self.clone());
        }

        macro_rules! cast_to {
            ($t:ty) => {
                with_numeric!(self, a => Some(ArrayValue::from(a.mapv(|x| x as $t))), _ => None)
            };
        }

        match var_type {
            VarType::Byte => cast_to!(i8),
            VarType::UByte => cast_to!(u8),
            VarType::Short => cast_to!(i16),
            VarType::UShort => cast_to!(u16),
            VarType::Int => cast_to!(i32),
            VarType::UInt => cast_to!(u32),
            VarType::Int64 => cast_to!(i64),
            VarType::UInt64 => cast_to!(u64),
            VarType::Float => cast_to!(f32),
            VarType::Double => cast_to!(f64),
            VarType::Char | VarType::String => None,
        }
    }

    /// Builds an array from row-major values and a shape.
    pub fn from_shape_vec<T>(shape: Vec<usize>, values: Vec<T>) -> Result<Self>
    where
        ArrayD<T>: Into<ArrayValue>,
    {
        Ok(ArrayD::from_shape_vec(shape, values)?.into())
    }
}

macro_rules! impl_array_conversions {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl<D: Dimension> From<Array<$t, D>> for ArrayValue {
                fn from(array: Array<$t, D>) -> Self {
                    ArrayValue::$variant(array.into_dyn())
                }
            }

            impl From<$t> for ArrayValue {
                fn from(value: $t) -> Self {
                    ArrayValue::$variant(arr0(value).into_dyn())
                }
            }

            impl TryFrom<ArrayValue> for ArrayD<$t> {
                type Error = ArrayValue;

                fn try_from(value: ArrayValue) -> std::result::Result<Self, Self::Error> {
                    match value {
                        ArrayValue::$variant(array) => Ok(array),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_array_conversions!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl<D: Dimension> From<Array<String, D>> for ArrayValue {
    fn from(array: Array<String, D>) -> Self {
        ArrayValue::Str(array.into_dyn())
    }
}

impl From<String> for ArrayValue {
    fn from(value: String) -> Self {
        ArrayValue::Str(arr0(value).into_dyn())
    }
}

impl From<&str> for ArrayValue {
    fn from(value: &str) -> Self {
        ArrayValue::Str(arr0(value.to_string()).into_dyn())
    }
}

impl TryFrom<ArrayValue> for ArrayD<String> {
    type Error = ArrayValue;

    fn try_from(value: ArrayValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ArrayValue::Str(array) => Ok(array),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, IxDyn};

    #[test]
    fn test_var_type_codes() {
        assert_eq!("float".parse::<VarType>().unwrap(), VarType::Double);
        assert_eq!("f4".parse::<VarType>().unwrap(), VarType::Float);
        assert_eq!("int".parse::<VarType>().unwrap(), VarType::Int);
        assert_eq!("u1".parse::<VarType>().unwrap(), VarType::UByte);
        assert_eq!(VarType::Int64.to_string(), "i8");
        assert_eq!("string".parse::<VarType>().unwrap(), VarType::String);
        assert_eq!("S1".parse::<VarType>().unwrap(), VarType::Char);
    }

    #[test]
    fn test_var_type_rejects_unknown() {
        match "complex128".parse::<VarType>() {
            Err(NcUtilsError::InvalidVarType(code)) => assert_eq!(code, "complex128"),
            other => panic!("Expected InvalidVarType, got {:?}", other),
        }
    }

    #[test]
    fn test_classic_types() {
        assert!(VarType::Double.is_classic());
        assert!(VarType::Byte.is_classic());
        assert!(!VarType::UInt64.is_classic());
        assert!(!VarType::UByte.is_classic());
        assert!(VarType::Char.is_classic());
        assert!(!VarType::String.is_classic());
    }

    #[test]
    fn test_array_value_from_static_dim() {
        let value: ArrayValue = Array2::<f64>::ones((10, 10)).into();
        assert_eq!(value.shape(), &[10, 10]);
        assert_eq!(value.ndim(), 2);
        assert_eq!(value.len(), 100);
        assert_eq!(value.var_type(), VarType::Double);
    }

    #[test]
    fn test_scalar_array_value() {
        let value = ArrayValue::from(7i32);
        assert_eq!(value.ndim(), 0);
        assert_eq!(value.len(), 1);
        assert_eq!(value.to_f64().unwrap()[IxDyn(&[])], 7.0);
    }

    #[test]
    fn test_try_from_matches_variant() {
        let value = ArrayValue::from_shape_vec(vec![2, 3], vec![1i16, 2, 3, 4, 5, 6]).unwrap();
        let back: ArrayD<i16> = value.clone().try_into().unwrap();
        assert_eq!(back[[1, 2]], 6);

        let wrong: std::result::Result<ArrayD<f32>, _> = value.try_into();
        assert!(wrong.is_err());
    }

    #[test]
    fn test_cast_to_storage_type() {
        let value = ArrayValue::from_shape_vec(vec![2], vec![1.5f64, -0.25]).unwrap();
        let narrowed = value.cast(VarType::Float).unwrap();
        assert_eq!(narrowed.var_type(), VarType::Float);
        assert_eq!(narrowed, ArrayValue::from_shape_vec(vec![2], vec![1.5f32, -0.25]).unwrap());
        assert_eq!(value.cast(VarType::Double), Some(value.clone()));
        assert_eq!(value.cast(VarType::String), None);
    }

    #[test]
    fn test_text_values() {
        let names = ArrayValue::from_shape_vec(
            vec![2],
            vec!["alpha".to_string(), "beta".to_string()],
        )
        .unwrap();
        assert_eq!(names.var_type(), VarType::String);
        assert_eq!(names.shape(), &[2]);
        assert!(names.to_f64().is_none());
        assert_eq!(names.cast(VarType::Int), None);
        assert_eq!(ArrayValue::from("x").ndim(), 0);

        let back: ArrayD<String> = names.try_into().unwrap();
        assert_eq!(back[[1]], "beta");
    }

    #[test]
    fn test_to_f64_widens() {
        let value = ArrayValue::from_shape_vec(vec![3], vec![1u8, 2, 255]).unwrap();
        let widened = value.to_f64().unwrap();
        assert_eq!(widened.as_slice().unwrap(), &[1.0, 2.0, 255.0]);
    }
}
