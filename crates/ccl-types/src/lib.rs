/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// The name of a CCL program to invoke.
///
/// A program name must contain at least one non-whitespace character. Unlike most text
/// primitives the input is stored verbatim: the host bridge receives exactly what the caller
/// supplied as the request target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramName(String);

impl ProgramName {
    /// Creates a new `ProgramName` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(ProgramName)` if the input has non-whitespace content,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the program name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProgramName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ProgramName {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for ProgramName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ProgramName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProgramName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name_accepts_plain_name() {
        let name = ProgramName::new("1_MP_GET_PATIENT").expect("valid name");
        assert_eq!(name.as_str(), "1_MP_GET_PATIENT");
        assert_eq!(name.to_string(), "1_MP_GET_PATIENT");
    }

    #[test]
    fn test_program_name_keeps_input_verbatim() {
        let name = ProgramName::new(" TEST ").expect("valid name");
        assert_eq!(name.as_str(), " TEST ");
    }

    #[test]
    fn test_program_name_rejects_empty_and_whitespace() {
        assert_eq!(ProgramName::new(""), Err(TextError::Empty));
        assert_eq!(ProgramName::new("   "), Err(TextError::Empty));
        assert_eq!(ProgramName::new("\t\n"), Err(TextError::Empty));
    }

    #[test]
    fn test_program_name_deserialize_validates() {
        let ok: ProgramName = serde_json::from_str("\"TEST\"").expect("deserialize");
        assert_eq!(ok.as_str(), "TEST");

        let err = serde_json::from_str::<ProgramName>("\"  \"").expect_err("should reject");
        assert!(err.to_string().contains("Text cannot be empty"));
    }
}
