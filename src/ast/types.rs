use std::fmt::Display;

/// A runtime type named in a parameter annotation or signature.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    /// `Int`, `String`, `Any`, ...
    Named(String),
    /// `[Int]`
    List(Box<TypeAnnotation>),
    /// `(Int, String)`
    Tuple(Vec<TypeAnnotation>),
    /// `?Int`
    Optional(Box<TypeAnnotation>),
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Named(name) => write!(f, "{}", name),
            TypeAnnotation::List(inner) => write!(f, "[{}]", inner),
            TypeAnnotation::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
            TypeAnnotation::Optional(inner) => write!(f, "?{}", inner),
        }
    }
}

/// `:: (Int, Int) -> Int`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSignature {
    pub parameters: Vec<TypeAnnotation>,
    pub returns: Option<TypeAnnotation>,
}

impl Display for TypeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|t| t.to_string()).collect();
        write!(f, "({})", params.join(", "))?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {}", returns)?;
        }
        Ok(())
    }
}
