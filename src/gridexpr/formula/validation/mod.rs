/*!
Compile-time validation of parsed formulas.

Resolution walks the AST against the table schema and the function
catalog, producing the formula's output type or a type error for the
whole expression. There is no partial success within one formula; batch
APIs recover per-expression independence one level up.
*/

pub mod resolver;

pub use resolver::TypeResolver;
