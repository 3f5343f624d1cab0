use thiserror::Error;

/// Evaluator-specific error types for better error handling
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Type error: {operation} requires {expected}, got {actual}")]
    TypeError {
        operation: String,
        expected: String,
        actual: String,
    },

    #[error("Type error: cannot {operation} {left_type} and {right_type}")]
    BinaryTypeError {
        operation: String,
        left_type: String,
        right_type: String,
    },

    #[error("Variable '{name}' not found")]
    VariableNotFound { name: String },

    #[error("Attribute '{attribute}' not found on {target}")]
    AttributeNotFound { attribute: String, target: String },

    #[error("{function}() missing required argument '{name}'")]
    MissingArgument { function: String, name: String },

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnknownKeyword { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() takes {expected} arguments but {got} were given")]
    TooManyArguments {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Value of type {actual} is not callable")]
    NotCallable { actual: &'static str },

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Maximum call depth of {limit} exceeded")]
    DepthExceeded { limit: usize },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl EvalError {
    /// Create a type error for unary operations
    pub fn unary_type_error(operation: &str, expected: &str, actual: &str) -> Self {
        Self::TypeError {
            operation: operation.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a type error for binary operations
    pub fn binary_type_error(operation: &str, left_type: &str, right_type: &str) -> Self {
        Self::BinaryTypeError {
            operation: operation.to_string(),
            left_type: left_type.to_string(),
            right_type: right_type.to_string(),
        }
    }

    /// Create a variable not found error
    pub fn variable_not_found(name: &str) -> Self {
        Self::VariableNotFound {
            name: name.to_string(),
        }
    }

    /// Create an attribute not found error
    pub fn attribute_not_found(attribute: &str, target: &str) -> Self {
        Self::AttributeNotFound {
            attribute: attribute.to_string(),
            target: target.to_string(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
