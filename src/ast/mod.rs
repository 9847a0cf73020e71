/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: The expression enum and shared helpers
/// - expressions: Node structs for every expression kind
/// - statements: Statement nodes and the Program root
/// - types: Type annotations and signatures
/// - render: Source-like Display implementations
pub mod ast;
pub mod expressions;
pub mod render;
pub mod statements;
pub mod types;
