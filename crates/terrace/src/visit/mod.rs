//! visitor pattern helpers
mod walk_symbols;
pub use walk_symbols::WalkSymbols;

/// Something an expression refers to
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    /// a standalone variable, i.e. a traversal with no operators
    Variable(&'a hcl::Variable),
    Traversal(&'a hcl::Traversal),
    FuncCall(&'a hcl::expr::FuncCall),
}

/// Name of the called function as written, `upper` or `provider::aws::arn_parse`
pub fn func_call_name(call: &hcl::expr::FuncCall) -> String {
    let mut name = String::new();
    for namespace in &call.name.namespace {
        name.push_str(namespace.as_str());
        name.push_str("::");
    }
    name.push_str(call.name.name.as_str());
    name
}

/// Visitor for [Symbol]s
pub trait VisitSymbol {
    fn visit_symbol(&mut self, symbol: Symbol<'_>);
}

// blanket impl for FnMut
impl<F> VisitSymbol for F
where
    F: FnMut(Symbol<'_>),
{
    fn visit_symbol(&mut self, symbol: Symbol<'_>) {
        self(symbol)
    }
}
