//! Tree-walk evaluator: renders a parsed [`Node`] list against a [`Context`]
//! and [`FilterRegistry`].

use crate::error::{TemplateError, TemplateResult};
use crate::filters::FilterRegistry;
use crate::parser::{Expr, Node};
use crate::value::{Context, Value};

/// Filters that only make sense applied to a string, not a sequence or a
/// boolean. Checked once, against the expression's raw context value,
/// before anything is stringified — later filters in a chain always see a
/// `String` output from the previous one and are never kind-mismatched.
const STRING_ONLY_FILTERS: &[&str] = &["upper", "lower", "capitalize", "trim"];

pub fn eval(nodes: &[Node], ctx: &Context, registry: &FilterRegistry) -> TemplateResult<String> {
    let mut out = String::new();
    eval_into(nodes, ctx, registry, &mut out)?;
    Ok(out)
}

fn eval_into(
    nodes: &[Node],
    ctx: &Context,
    registry: &FilterRegistry,
    out: &mut String,
) -> TemplateResult<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output(expr) => out.push_str(&eval_expr(expr, ctx, registry)?),
            Node::If(var, body) => {
                let truthy = ctx.get(var).map(Value::is_truthy).unwrap_or(false);
                if truthy {
                    eval_into(body, ctx, registry, out)?;
                }
            }
            Node::For(loop_var, seq_var, body) => {
                let items: Vec<String> = match ctx.get(seq_var) {
                    Some(Value::Sequence(items)) => items.clone(),
                    Some(Value::String(s)) => vec![s.clone()],
                    Some(Value::Bool(_)) | None => Vec::new(),
                };
                for (idx, item) in items.into_iter().enumerate() {
                    let mut loop_ctx = ctx.clone();
                    loop_ctx.set(loop_var.clone(), item);
                    loop_ctx.set("loop.index".to_string(), (idx + 1).to_string());
                    eval_into(body, &loop_ctx, registry, out)?;
                }
            }
        }
    }
    Ok(())
}

fn eval_expr(expr: &Expr, ctx: &Context, registry: &FilterRegistry) -> TemplateResult<String> {
    let bound = ctx.get(&expr.var);
    let kind = bound.map(Value::kind_name).unwrap_or("string");

    if let Some(first) = expr.filters.first() {
        if STRING_ONLY_FILTERS.contains(&first.name.as_str()) && kind != "string" {
            return Err(TemplateError::FilterTypeMismatch {
                filter: first.name.clone(),
                actual: kind,
            });
        }
    }

    let mut value = match bound {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Sequence(items)) => items.join(","),
        None => String::new(),
    };

    for filter in &expr.filters {
        value = registry.apply(&filter.name, &value, filter.arg.as_deref())?;
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn render(src: &str, ctx: &Context) -> TemplateResult<String> {
        let registry = FilterRegistry::new();
        let nodes = parse(lex(src).unwrap(), &registry).unwrap();
        eval(&nodes, ctx, &registry)
    }

    #[test]
    fn substitutes_plain_variable() {
        let mut ctx = Context::new();
        ctx.set("name", "alice");
        assert_eq!(render("Hi {{ name }}!", &ctx).unwrap(), "Hi alice!");
    }

    #[test]
    fn unknown_variable_renders_empty_string() {
        let ctx = Context::new();
        assert_eq!(render("[{{ missing }}]", &ctx).unwrap(), "[]");
    }

    #[test]
    fn if_block_respects_truthiness() {
        let mut ctx = Context::new();
        ctx.set("admin", true);
        assert_eq!(render("{% if admin %}yes{% endif %}", &ctx).unwrap(), "yes");
        ctx.set("admin", false);
        assert_eq!(render("{% if admin %}yes{% endif %}", &ctx).unwrap(), "");
    }

    #[test]
    fn for_loop_exposes_loop_index() {
        let mut ctx = Context::new();
        ctx.set("fruits", vec!["apple".to_string(), "pear".to_string()]);
        let out = render("{% for f in fruits %}{{ loop.index }}:{{ f | upper }} {% endfor %}", &ctx).unwrap();
        assert_eq!(out, "1:APPLE 2:PEAR ");
    }

    #[test]
    fn filter_chain_applies_left_to_right() {
        let mut ctx = Context::new();
        ctx.set("name", "  bob  ");
        assert_eq!(render("{{ name | trim | capitalize }}", &ctx).unwrap(), "Bob");
    }

    #[test]
    fn string_only_filter_on_a_sequence_is_a_type_mismatch() {
        let mut ctx = Context::new();
        ctx.set("items", vec!["a".to_string(), "b".to_string()]);
        let err = render("{{ items | upper }}", &ctx).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::FilterTypeMismatch { ref filter, actual } if filter == "upper" && actual == "sequence"
        ));
    }

    #[test]
    fn default_filter_fills_in_for_missing_variable() {
        let ctx = Context::new();
        assert_eq!(render(r#"{{ name | default:"anon" }}"#, &ctx).unwrap(), "anon");
    }

    #[test]
    fn combined_admin_scenario() {
        let mut ctx = Context::new();
        ctx.set("user", "bob");
        ctx.set("admin", true);
        let out = render("Hello {{ user | capitalize }}{% if admin %} (admin){% endif %}!", &ctx).unwrap();
        assert_eq!(out, "Hello Bob (admin)!");
    }
}
