//! Canonical text-dump writer for `--show transformed-ram`: an indented
//! tree using the same operation node names §4.8 defines. Adornment-derived
//! relation names (`R.{bf}`, `@magic.R.{b}`, `@neglabel.R`, `@poscopy_k.R`,
//! `@abdulN`, `@split_in.R`, `@interm_in.R`, `@interm_out.R`) are emitted
//! verbatim since downstream tooling matches on the exact spelling.

use crate::ir::{Condition, Expression, Operation, RamProgram, Statement};
use std::fmt::Write as _;

const INDENT: &str = "  ";

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_expression(out: &mut String, expr: &Expression) {
    match expr {
        Expression::TupleElement { identifier, element } => {
            let _ = write!(out, "t{identifier}.{element}");
        }
        Expression::SignedConstant(v) => {
            let _ = write!(out, "{v}");
        }
        Expression::UnsignedConstant(v) => {
            let _ = write!(out, "{v}u");
        }
        Expression::FloatConstant(v) => {
            let _ = write!(out, "{v}f");
        }
        Expression::StringConstant(s) => {
            let _ = write!(out, "\"{s}\"");
        }
        Expression::Nil => out.push_str("nil"),
        Expression::RelationSize(rel) => {
            let _ = write!(out, "RelationSize({rel})");
        }
        Expression::AutoIncrement => out.push_str("AutoIncrement()"),
        Expression::IntrinsicOperator(op, args) => {
            let _ = write!(out, "{op:?}(");
            write_expression_list(out, args);
            out.push(')');
        }
        Expression::UserDefinedOperator { name, args, .. } => {
            let _ = write!(out, "@{name}(");
            write_expression_list(out, args);
            out.push(')');
        }
        Expression::PackRecord(fields) => {
            out.push_str("PackRecord(");
            write_expression_list(out, fields);
            out.push(')');
        }
        Expression::PackBranch { branch_id, payload } => {
            let _ = write!(out, "PackBranch({branch_id}, ");
            write_expression(out, payload);
            out.push(')');
        }
        Expression::UnpackRecordField { record, index } => {
            write_expression(out, record);
            let _ = write!(out, ".{index}");
        }
        Expression::SubroutineArgument(i) => {
            let _ = write!(out, "argument({i})");
        }
    }
}

fn write_expression_list(out: &mut String, exprs: &[Expression]) {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expression(out, e);
    }
}

fn write_condition(out: &mut String, cond: &Condition) {
    match cond {
        Condition::Comparison(op, lhs, rhs) => {
            write_expression(out, lhs);
            let _ = write!(out, " {op:?} ");
            write_expression(out, rhs);
        }
        Condition::Negation(inner) => {
            out.push('!');
            write_condition(out, inner);
        }
        Condition::Conjunction(parts) => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(" AND ");
                }
                write_condition(out, part);
            }
        }
        Condition::EmptinessCheck(rel) => {
            let _ = write!(out, "({rel} = ∅)");
        }
        Condition::ExistenceCheck { relation, args } => {
            let _ = write!(out, "({relation}(");
            write_expression_list(out, args);
            out.push_str("))");
        }
        Condition::ProvenanceCondition(expr) => {
            out.push_str("provenance(");
            write_expression(out, expr);
            out.push(')');
        }
    }
}

fn write_operation(out: &mut String, op: &Operation, depth: usize) {
    indent(out, depth);
    match op {
        Operation::Scan { relation, identifier, body } => {
            let _ = writeln!(out, "SCAN {relation} AS t{identifier}");
            write_operation(out, body, depth + 1);
        }
        Operation::IndexScan { relation, identifier, pattern, body } => {
            let _ = write!(out, "INDEXSCAN {relation} AS t{identifier} WHERE (");
            for (i, slot) in pattern.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match slot {
                    Some(e) => write_expression(out, e),
                    None => out.push('_'),
                }
            }
            out.push_str(")\n");
            write_operation(out, body, depth + 1);
        }
        Operation::UnpackRecord { identifier, index, record_identifier, body, .. } => {
            let _ = writeln!(out, "UNPACKRECORD t{identifier}.{index} AS t{record_identifier}");
            write_operation(out, body, depth + 1);
        }
        Operation::Filter { condition, body } => {
            out.push_str("IF ");
            write_condition(out, condition);
            out.push('\n');
            write_operation(out, body, depth + 1);
        }
        Operation::Aggregate { target_identifier, op, target, body, then } => {
            let _ = write!(out, "AGGREGATE t{target_identifier} = {op:?}(");
            if let Some(t) = target {
                write_expression(out, t);
            }
            out.push_str(")\n");
            write_operation(out, body, depth + 1);
            write_operation(out, then, depth);
        }
        Operation::Insert { relation, args } => {
            let _ = write!(out, "INSERT ({relation}, [");
            write_expression_list(out, args);
            out.push_str("])\n");
        }
        Operation::ProvenanceInsert { relation, args, rule_number } => {
            let _ = write!(out, "PROVENANCE-INSERT ({relation}, [");
            write_expression_list(out, args);
            let _ = writeln!(out, "], rule {rule_number})");
        }
    }
}

fn write_statement(out: &mut String, stmt: &Statement, depth: usize) {
    match stmt {
        Statement::Sequence(statements) => {
            for s in statements {
                write_statement(out, s, depth);
            }
        }
        Statement::Loop(body) => {
            indent(out, depth);
            out.push_str("LOOP\n");
            write_statement(out, body, depth + 1);
            indent(out, depth);
            out.push_str("END LOOP\n");
        }
        Statement::Exit(condition) => {
            indent(out, depth);
            out.push_str("EXIT ");
            write_condition(out, condition);
            out.push('\n');
        }
        Statement::Query(op) => write_operation(out, op, depth),
        Statement::Merge { from, to } => {
            indent(out, depth);
            let _ = writeln!(out, "MERGE {from} INTO {to}");
        }
        Statement::Clear(rel) => {
            indent(out, depth);
            let _ = writeln!(out, "CLEAR {rel}");
        }
        Statement::Swap(a, b) => {
            indent(out, depth);
            let _ = writeln!(out, "SWAP {a}, {b}");
        }
        Statement::Parallel(statements) => {
            indent(out, depth);
            out.push_str("PARALLEL\n");
            for s in statements {
                write_statement(out, s, depth + 1);
            }
        }
        Statement::IO { relation, directive, parameters } => {
            indent(out, depth);
            let _ = write!(out, "IO {directive:?} {relation} {{");
            for (i, (k, v)) in parameters.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{k}={v}");
            }
            out.push_str("}\n");
        }
        Statement::Call(name) => {
            indent(out, depth);
            let _ = writeln!(out, "CALL {name}");
        }
        Statement::LogSize { relation, label } => {
            indent(out, depth);
            let _ = writeln!(out, "LOGSIZE {relation} \"{label}\"");
        }
    }
}

/// Renders a `RamProgram` as the indented tree `--show transformed-ram`
/// emits: relation declarations, the main statement tree, then every
/// subroutine in name order.
#[must_use]
pub fn dump(program: &RamProgram) -> String {
    let mut out = String::new();
    for relation in &program.relations {
        let _ = writeln!(out, "DECLARATION {}({}) {:?}", relation.name, relation.attribute_types.join(","), relation.representation);
    }
    out.push_str("MAIN\n");
    if let Some(main) = &program.main {
        write_statement(&mut out, main, 1);
    }
    for (name, body) in &program.subroutines {
        let _ = writeln!(out, "SUBROUTINE {name}");
        write_statement(&mut out, body, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RelationDecl;

    #[test]
    fn declares_and_renders_main_sequence() {
        let mut program = RamProgram::new();
        program.declare(RelationDecl::new("result", vec!["number".into()]));
        program.main = Some(Statement::Sequence(vec![Statement::Query(Operation::Insert {
            relation: "result".into(),
            args: vec![Expression::SignedConstant(1)],
        })]));

        let text = dump(&program);
        assert!(text.contains("DECLARATION result(number)"));
        assert!(text.contains("INSERT (result, [1])"));
    }

    #[test]
    fn adornment_names_are_emitted_verbatim() {
        let mut program = RamProgram::new();
        program.declare(RelationDecl::new("@magic.Query.{b}", vec!["number".into()]));
        let text = dump(&program);
        assert!(text.contains("@magic.Query.{b}"));
    }
}
