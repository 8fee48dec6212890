use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    SingularMatrix { determinant: f32 },
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingularMatrix { determinant } => {
                write!(f, "matrix is not invertible (determinant {determinant})")
            }
        }
    }
}

impl std::error::Error for MathError {}
