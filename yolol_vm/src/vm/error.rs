use yolol_vm_parser::ParseErrors;

/// Errors returned by the VM's public API.
///
/// Failures while a line runs are [`crate::error::RuntimeError`]s and go to
/// the error handler instead.
#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    /// The source handed to [`super::Vm::from_source`] does not parse
    Parse(ParseErrors),
    InvalidVariableName(String),
    /// Only global (`:name`) variables live in a coordinator
    NotGlobal(String),
    Snapshot(String),
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(errors) => write!(f, "Program does not parse: {}", errors),
            Self::InvalidVariableName(name) => write!(f, "Invalid variable name: '{}'", name),
            Self::NotGlobal(name) => {
                write!(f, "Variable '{}' is not global (expected ':{}')", name, name)
            }
            Self::Snapshot(message) => write!(f, "Could not serialize snapshot: {}", message),
        }
    }
}

impl std::error::Error for VmError {}

impl From<ParseErrors> for VmError {
    fn from(errors: ParseErrors) -> Self {
        Self::Parse(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            VmError::InvalidVariableName("1x".to_string()).to_string(),
            "Invalid variable name: '1x'"
        );
        assert!(VmError::NotGlobal("x".to_string()).to_string().contains("':x'"));
    }
}
