use crate::addrs::{Reference, RefParser, FUNCTION_NAMESPACE_PROVIDER};
use crate::diagnostics::Diagnostics;
use crate::traversal::Traversal;
use crate::visit::{func_call_name, Symbol, WalkSymbols};

/// Every reference in an expression, in source order
///
/// Calls to provider functions are references too, calls to any other function are not.
pub fn references_in_expr(
    parse_ref: RefParser,
    expr: &hcl::Expression,
) -> (Vec<Reference>, Diagnostics) {
    references(parse_ref, expr)
}

/// Every reference in the attributes and nested blocks of a body
pub fn references_in_body(parse_ref: RefParser, body: &hcl::Body) -> (Vec<Reference>, Diagnostics) {
    references(parse_ref, body)
}

fn references(parse_ref: RefParser, node: &dyn WalkSymbols) -> (Vec<Reference>, Diagnostics) {
    let mut traversals = vec![];
    node.walk_symbols(&mut |symbol: Symbol<'_>| match symbol {
        Symbol::Variable(variable) => traversals.push(Traversal::root(variable.as_str())),
        Symbol::Traversal(traversal) => traversals.extend(Traversal::from_hcl(traversal)),
        Symbol::FuncCall(call) => {
            let name = func_call_name(call);
            if name.starts_with(&format!("{FUNCTION_NAMESPACE_PROVIDER}::")) {
                traversals.push(Traversal::root(name));
            }
        }
    });

    let mut refs = vec![];
    let mut diags = Diagnostics::new();
    for traversal in &traversals {
        match parse_ref(traversal) {
            Ok(reference) => refs.push(reference),
            Err(errors) => diags.extend(errors),
        }
    }
    tracing::trace!(refs = refs.len(), errors = diags.len(), "collected references");
    (refs, diags)
}

/// The static prefix of every traversal in an expression
pub(super) fn static_traversals(expr: &hcl::Expression) -> Vec<Traversal> {
    let mut traversals = vec![];
    expr.walk_symbols(&mut |symbol: Symbol<'_>| match symbol {
        Symbol::Variable(variable) => traversals.push(Traversal::root(variable.as_str())),
        Symbol::Traversal(traversal) => traversals.extend(Traversal::from_hcl(traversal)),
        Symbol::FuncCall(_) => {}
    });
    traversals
}

/// Names of every function an expression calls
pub(super) fn called_functions(expr: &hcl::Expression) -> Vec<String> {
    let mut names = vec![];
    expr.walk_symbols(&mut |symbol: Symbol<'_>| {
        if let Symbol::FuncCall(call) = symbol {
            names.push(func_call_name(call));
        }
    });
    names
}
