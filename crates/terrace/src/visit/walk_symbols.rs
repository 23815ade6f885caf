use super::{Symbol, VisitSymbol};
use hcl::{
    template::{Directive, Element},
    Body, Expression, Identifier, Operation, Structure, Template, TraversalOperator,
};

/// Recursively visit all [Symbol]s
pub trait WalkSymbols {
    fn walk_symbols(&self, visitor: &mut dyn VisitSymbol);
}

impl WalkSymbols for Body {
    fn walk_symbols(&self, visitor: &mut dyn VisitSymbol) {
        for structure in self {
            match structure {
                Structure::Attribute(attr) => attr.expr.walk_symbols(visitor),
                Structure::Block(block) => block.body.walk_symbols(visitor),
            }
        }
    }
}

impl WalkSymbols for Expression {
    fn walk_symbols(&self, visitor: &mut dyn VisitSymbol) {
        match self {
            Expression::Variable(variable) => visitor.visit_symbol(Symbol::Variable(variable)),
            Expression::Traversal(traversal) => {
                visitor.visit_symbol(Symbol::Traversal(traversal));
                // the root variable is part of the traversal itself
                if !matches!(traversal.expr, Expression::Variable(_)) {
                    traversal.expr.walk_symbols(visitor);
                }
                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.walk_symbols(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.walk_symbols(visitor);
                }
            }
            Expression::Object(object) => {
                for value in object.values() {
                    value.walk_symbols(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                if let Ok(template) = Template::from_expr(template_expr) {
                    template.walk_symbols(visitor);
                }
            }
            Expression::FuncCall(func_call) => {
                visitor.visit_symbol(Symbol::FuncCall(func_call));
                for arg in &func_call.args {
                    arg.walk_symbols(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.walk_symbols(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.walk_symbols(visitor);
                cond.true_expr.walk_symbols(visitor);
                cond.false_expr.walk_symbols(visitor);
            }
            Expression::Operation(operation) => match operation.as_ref() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.walk_symbols(visitor);
                    binop.rhs_expr.walk_symbols(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.walk_symbols(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.walk_symbols(visitor);
                let mut inner = Shadowed::new(
                    forexpr.key_var.as_ref(),
                    &forexpr.value_var,
                    visitor,
                );
                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.walk_symbols(&mut inner));
                forexpr.value_expr.walk_symbols(&mut inner);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.walk_symbols(&mut inner));
            }
            _ => {}
        }
    }
}

impl WalkSymbols for Template {
    fn walk_symbols(&self, visitor: &mut dyn VisitSymbol) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.walk_symbols(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.walk_symbols(visitor);
                        ifdir.true_template.walk_symbols(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.walk_symbols(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.walk_symbols(visitor);
                        let mut inner =
                            Shadowed::new(fordir.key_var.as_ref(), &fordir.value_var, visitor);
                        fordir.template.walk_symbols(&mut inner);
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}

/// Drops symbols rooted at the iterator variables of a `for` expression
struct Shadowed<'n, 'v> {
    names: Vec<&'n str>,
    inner: &'v mut dyn VisitSymbol,
}

impl<'n, 'v> Shadowed<'n, 'v> {
    fn new(
        key_var: Option<&'n Identifier>,
        value_var: &'n Identifier,
        inner: &'v mut dyn VisitSymbol,
    ) -> Self {
        let mut names = vec![value_var.as_str()];
        names.extend(key_var.map(Identifier::as_str));
        Self { names, inner }
    }
}

impl VisitSymbol for Shadowed<'_, '_> {
    fn visit_symbol(&mut self, symbol: Symbol<'_>) {
        let root = match symbol {
            Symbol::Variable(variable) => Some(variable.as_str()),
            Symbol::Traversal(traversal) => match &traversal.expr {
                Expression::Variable(variable) => Some(variable.as_str()),
                _ => None,
            },
            Symbol::FuncCall(_) => None,
        };
        if root.is_some_and(|root| self.names.contains(&root)) {
            return;
        }
        self.inner.visit_symbol(symbol);
    }
}
