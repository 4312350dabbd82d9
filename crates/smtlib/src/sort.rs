/// Logical sort of a formula.
///
/// The encoder only models scalar integers and booleans, so the sort
/// universe is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Mathematical integer sort
    Int,
}
