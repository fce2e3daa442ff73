//! Recursive-descent parser for Datalog surface syntax. Lexes via
//! [`lexer`], then builds the AST directly — sufficient to drive the
//! end-to-end scenarios this crate tests against, not a production-grade
//! implementation of the full surface grammar (no plan annotations, no
//! choice-domain clauses).

pub mod lexer;

use crate::ast::{
    AdtBranch, AggregateOp, Argument, Atom, BinaryConstraintOp, Clause, Component, ComponentInit,
    ComponentType, Directive, DirectiveKind, FunctionalDependency, FunctorDeclaration,
    IntrinsicOp, Literal, NumericType, ParamAttribute, Program, Pragma, QualifiedName,
    RecordField, Relation, RelationQualifier, Representation, TypeDecl, TypeDeclKind,
};
use lexer::{Lexer, Spanned, Token};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected token {found:?}, expected {expected}")]
    UnexpectedToken { line: u32, column: u32, found: String, expected: String },
    #[error("{line}:{column}: unknown directive keyword '.{keyword}'")]
    UnknownKeyword { line: u32, column: u32, keyword: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

/// Parses a complete Datalog source unit into a `Program`.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser { tokens, pos: 0 };
    let block = parser.parse_block(None)?;
    Ok(Program {
        types: block.types,
        relations: block.relations,
        functor_declarations: block.functor_declarations,
        clauses: block.clauses,
        directives: block.directives,
        components: block.components,
        instantiations: block.instantiations,
        pragmas: block.pragmas,
    })
}

#[derive(Default)]
struct ParsedBlock {
    types: Vec<TypeDecl>,
    relations: Vec<Relation>,
    functor_declarations: Vec<FunctorDeclaration>,
    clauses: Vec<Clause>,
    directives: Vec<Directive>,
    components: Vec<Component>,
    instantiations: Vec<ComponentInit>,
    overrides: HashSet<String>,
    pragmas: Vec<Pragma>,
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_spanned(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Spanned {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<Spanned, ParseError> {
        if self.peek() == token {
            Ok(self.bump())
        } else {
            self.err_here(expected)
        }
    }

    fn err_here<T>(&self, expected: &str) -> Result<T, ParseError> {
        let sp = self.peek_spanned();
        if sp.token == Token::Eof {
            Err(ParseError::UnexpectedEof { expected: expected.to_string() })
        } else {
            Err(ParseError::UnexpectedToken {
                line: sp.line,
                column: sp.column,
                found: format!("{:?}", sp.token),
                expected: expected.to_string(),
            })
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.bump();
                Ok(name)
            }
            _ => self.err_here(expected),
        }
    }

    fn at_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == word)
    }

    /// Reads a bare word that may contain hyphens (`magic-transform`,
    /// `fact-dir`) — pragma keys and directive parameter names are never
    /// arithmetic expressions, so a trailing `-ident` run is unambiguously
    /// part of the word rather than a subtraction.
    fn parse_hyphenated_word(&mut self, expected: &str) -> Result<String, ParseError> {
        let mut word = self.expect_ident(expected)?;
        while self.peek() == &Token::Minus {
            if let Token::Ident(_) = &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token {
                self.bump();
                word.push('-');
                word.push_str(&self.expect_ident(expected)?);
            } else {
                break;
            }
        }
        Ok(word)
    }

    fn parse_block(&mut self, terminator: Option<Token>) -> Result<ParsedBlock, ParseError> {
        let mut block = ParsedBlock::default();
        loop {
            if let Some(t) = &terminator {
                if self.peek() == t {
                    break;
                }
            }
            if self.peek() == &Token::Eof {
                break;
            }

            if self.peek() == &Token::Dot {
                self.bump();
                let keyword = self.expect_ident("a directive keyword")?;
                match keyword.as_str() {
                    "decl" => block.relations.push(self.parse_relation_decl()?),
                    "type" => block.types.push(self.parse_type_decl()?),
                    "declfun" => block.functor_declarations.push(self.parse_functor_decl()?),
                    "input" => block.directives.push(self.parse_directive(DirectiveKind::Input)?),
                    "output" => block.directives.push(self.parse_directive(DirectiveKind::Output)?),
                    "printsize" => block.directives.push(self.parse_directive(DirectiveKind::Printsize)?),
                    "limitsize" => block.directives.push(self.parse_directive(DirectiveKind::Limitsize)?),
                    "pragma" => block.pragmas.push(self.parse_pragma()?),
                    "comp" => block.components.push(self.parse_component()?),
                    "init" => block.instantiations.push(self.parse_component_init()?),
                    "override" => {
                        let name = self.expect_ident("an overridden relation name")?;
                        self.expect(&Token::Dot, ".")?;
                        block.overrides.insert(name);
                    }
                    other => {
                        let sp = self.peek_spanned();
                        return Err(ParseError::UnknownKeyword {
                            line: sp.line,
                            column: sp.column,
                            keyword: other.to_string(),
                        });
                    }
                }
            } else {
                block.clauses.push(self.parse_clause()?);
            }
        }
        Ok(block)
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName, ParseError> {
        let first = self.expect_ident("an identifier")?;
        let mut segments = vec![first];
        while self.peek() == &Token::Dot {
            if let Token::Ident(_) = &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token {
                self.bump();
                segments.push(self.expect_ident("an identifier")?);
            } else {
                break;
            }
        }
        Ok(QualifiedName::new(segments))
    }

    fn parse_attribute_list(&mut self) -> Result<Vec<crate::ast::Attribute>, ParseError> {
        let mut attrs = Vec::new();
        if self.peek() == &Token::RParen {
            return Ok(attrs);
        }
        loop {
            let name = self.expect_ident("an attribute name")?;
            self.expect(&Token::Colon, ":")?;
            let type_name = self.parse_qualified_name()?;
            attrs.push(crate::ast::Attribute { name, type_name });
            if self.peek() == &Token::Comma {
                self.bump();
                continue;
            }
            break;
        }
        Ok(attrs)
    }

    fn parse_relation_decl(&mut self) -> Result<Relation, ParseError> {
        let name = self.parse_qualified_name()?;
        let attributes = if self.peek() == &Token::LParen {
            self.bump();
            let attrs = self.parse_attribute_list()?;
            self.expect(&Token::RParen, ")")?;
            attrs
        } else {
            Vec::new()
        };
        let mut relation = Relation::new(name, attributes);
        loop {
            let Token::Ident(word) = self.peek().clone() else { break };
            match word.as_str() {
                "input" => {
                    relation.qualifiers.insert(RelationQualifier::Input);
                }
                "output" => {
                    relation.qualifiers.insert(RelationQualifier::Output);
                }
                "printsize" => {
                    relation.qualifiers.insert(RelationQualifier::Printsize);
                }
                "overridable" => {
                    relation.qualifiers.insert(RelationQualifier::Overridable);
                }
                "inline" => {
                    relation.qualifiers.insert(RelationQualifier::Inline);
                }
                "noinline" => {
                    relation.qualifiers.insert(RelationQualifier::NoInline);
                }
                "magic" => {
                    relation.qualifiers.insert(RelationQualifier::Magic);
                }
                "nomagic" => {
                    relation.qualifiers.insert(RelationQualifier::NoMagic);
                }
                "suppressed" => {
                    relation.qualifiers.insert(RelationQualifier::Suppressed);
                }
                "btree" => relation.representation = Representation::Btree,
                "brie" => relation.representation = Representation::Brie,
                "eqrel" => relation.representation = Representation::Eqrel,
                _ => break,
            }
            self.bump();
        }
        if self.at_ident("fd") {
            relation.functional_dependencies.push(self.parse_functional_dependency()?);
        }
        self.expect(&Token::Dot, ".")?;
        Ok(relation)
    }

    fn parse_functional_dependency(&mut self) -> Result<FunctionalDependency, ParseError> {
        self.bump();
        self.expect(&Token::LParen, "(")?;
        let determinant = self.parse_ident_list(&Token::RParen)?;
        self.expect(&Token::RParen, ")")?;
        self.expect(&Token::Minus, "->")?;
        self.expect(&Token::Gt, ">")?;
        self.expect(&Token::LParen, "(")?;
        let dependent = self.parse_ident_list(&Token::RParen)?;
        self.expect(&Token::RParen, ")")?;
        Ok(FunctionalDependency { determinant, dependent })
    }

    fn parse_ident_list(&mut self, terminator: &Token) -> Result<Vec<String>, ParseError> {
        let mut out = Vec::new();
        if self.peek() == terminator {
            return Ok(out);
        }
        loop {
            out.push(self.expect_ident("an identifier")?);
            if self.peek() == &Token::Comma {
                self.bump();
                continue;
            }
            break;
        }
        Ok(out)
    }

    fn parse_record_fields(&mut self, terminator: &Token) -> Result<Vec<RecordField>, ParseError> {
        let mut fields = Vec::new();
        if self.peek() == terminator {
            return Ok(fields);
        }
        loop {
            let name = self.expect_ident("a field name")?;
            self.expect(&Token::Colon, ":")?;
            let type_name = self.parse_qualified_name()?;
            fields.push(RecordField { name, type_name });
            if self.peek() == &Token::Comma {
                self.bump();
                continue;
            }
            break;
        }
        Ok(fields)
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let name = self.parse_qualified_name()?;
        let kind = if self.peek() == &Token::Subset {
            self.bump();
            TypeDeclKind::Subset(self.parse_qualified_name()?)
        } else if self.peek() == &Token::Eq {
            self.bump();
            if self.peek() == &Token::LBracket {
                self.bump();
                let fields = self.parse_record_fields(&Token::RBracket)?;
                self.expect(&Token::RBracket, "]")?;
                TypeDeclKind::Record(fields)
            } else {
                let mut branches = Vec::new();
                loop {
                    let constructor = self.parse_qualified_name()?;
                    let fields = if self.peek() == &Token::LBrace {
                        self.bump();
                        let f = self.parse_record_fields(&Token::RBrace)?;
                        self.expect(&Token::RBrace, "}")?;
                        f
                    } else {
                        Vec::new()
                    };
                    branches.push(AdtBranch { constructor, fields });
                    if self.peek() == &Token::Pipe {
                        self.bump();
                        continue;
                    }
                    break;
                }
                if branches.iter().all(|b| b.fields.is_empty()) {
                    TypeDeclKind::Union(branches.into_iter().map(|b| b.constructor).collect())
                } else {
                    TypeDeclKind::Adt(branches)
                }
            }
        } else {
            TypeDeclKind::Primitive
        };
        self.expect(&Token::Dot, ".")?;
        Ok(TypeDecl { name, kind, position: None })
    }

    fn parse_type_name_list(&mut self, terminator: &Token) -> Result<Vec<QualifiedName>, ParseError> {
        let mut out = Vec::new();
        if self.peek() == terminator {
            return Ok(out);
        }
        loop {
            out.push(self.parse_qualified_name()?);
            if self.peek() == &Token::Comma {
                self.bump();
                continue;
            }
            break;
        }
        Ok(out)
    }

    fn parse_functor_decl(&mut self) -> Result<FunctorDeclaration, ParseError> {
        let name = self.expect_ident("a functor name")?;
        self.expect(&Token::LParen, "(")?;
        let params = self.parse_type_name_list(&Token::RParen)?;
        self.expect(&Token::RParen, ")")?;
        self.expect(&Token::Colon, ":")?;
        let return_type = self.parse_qualified_name()?;
        let stateful = if self.at_ident("stateful") {
            self.bump();
            true
        } else {
            false
        };
        self.expect(&Token::Dot, ".")?;
        Ok(FunctorDeclaration {
            name,
            params: params.into_iter().map(|type_name| ParamAttribute { type_name }).collect(),
            return_type: ParamAttribute { type_name: return_type },
            stateful,
            position: None,
        })
    }

    fn parse_directive(&mut self, kind: DirectiveKind) -> Result<Directive, ParseError> {
        let relation = self.parse_qualified_name()?;
        let mut directive = Directive::new(kind, relation);
        if self.peek() == &Token::LParen {
            self.bump();
            if self.peek() != &Token::RParen {
                loop {
                    let key = self.parse_hyphenated_word("a parameter name")?;
                    self.expect(&Token::Eq, "=")?;
                    let value = self.parse_directive_value()?;
                    directive.set(key, value);
                    if self.peek() == &Token::Comma {
                        self.bump();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&Token::RParen, ")")?;
        }
        self.expect(&Token::Dot, ".")?;
        Ok(directive)
    }

    fn parse_directive_value(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::StringLit(s) => {
                self.bump();
                Ok(s)
            }
            Token::Ident(s) => {
                self.bump();
                Ok(s)
            }
            Token::Number(s) => {
                self.bump();
                Ok(s)
            }
            _ => self.err_here("a directive parameter value"),
        }
    }

    fn parse_pragma(&mut self) -> Result<Pragma, ParseError> {
        let key = self.parse_hyphenated_word("a pragma key")?;
        let value = self.parse_directive_value()?;
        self.expect(&Token::Dot, ".")?;
        Ok(Pragma { key, value })
    }

    fn parse_component(&mut self) -> Result<Component, ParseError> {
        let name = self.expect_ident("a component name")?;
        let formal_type_params = if self.peek() == &Token::Lt {
            self.bump();
            let params = self.parse_type_name_list(&Token::Gt)?;
            self.expect(&Token::Gt, ">")?;
            params
        } else {
            Vec::new()
        };
        let base_components = if self.peek() == &Token::Colon {
            self.bump();
            let mut bases = Vec::new();
            loop {
                bases.push(self.parse_component_type()?);
                if self.peek() == &Token::Comma {
                    self.bump();
                    continue;
                }
                break;
            }
            bases
        } else {
            Vec::new()
        };
        self.expect(&Token::Eq, "=")?;
        self.expect(&Token::LBrace, "{")?;
        let block = self.parse_block(Some(Token::RBrace))?;
        self.expect(&Token::RBrace, "}")?;

        let mut component = Component::new(QualifiedName::from(name.as_str()));
        component.formal_type_params = formal_type_params;
        component.base_components = base_components;
        component.types = block.types;
        component.relations = block.relations;
        component.clauses = block.clauses;
        component.directives = block.directives;
        component.components = block.components;
        component.instantiations = block.instantiations;
        component.overrides = block.overrides;
        Ok(component)
    }

    fn parse_component_type(&mut self) -> Result<ComponentType, ParseError> {
        let name = self.expect_ident("a component type name")?;
        let type_params = if self.peek() == &Token::Lt {
            self.bump();
            let params = self.parse_type_name_list(&Token::Gt)?;
            self.expect(&Token::Gt, ">")?;
            params
        } else {
            Vec::new()
        };
        Ok(ComponentType { name: QualifiedName::from(name.as_str()), type_params })
    }

    fn parse_component_init(&mut self) -> Result<ComponentInit, ParseError> {
        let instance_name = self.expect_ident("an instance name")?;
        self.expect(&Token::Eq, "=")?;
        let component_type = self.parse_component_type()?;
        self.expect(&Token::Dot, ".")?;
        Ok(ComponentInit { instance_name, component_type, position: None })
    }

    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let head = self.parse_atom()?;
        let body = if self.peek() == &Token::ColonDash {
            self.bump();
            self.parse_literal_list()?
        } else {
            Vec::new()
        };
        self.expect(&Token::Dot, ".")?;
        Ok(Clause::new(head, body))
    }

    fn parse_literal_list(&mut self) -> Result<Vec<Literal>, ParseError> {
        let mut literals = vec![self.parse_literal()?];
        while self.peek() == &Token::Comma {
            self.bump();
            literals.push(self.parse_literal()?);
        }
        Ok(literals)
    }

    fn parse_atom(&mut self) -> Result<Atom, ParseError> {
        let name = self.parse_qualified_name()?;
        self.expect(&Token::LParen, "(")?;
        let args = self.parse_argument_list(&Token::RParen)?;
        self.expect(&Token::RParen, ")")?;
        Ok(Atom::new(name, args))
    }

    fn parse_argument_list(&mut self, terminator: &Token) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        if self.peek() == terminator {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            if self.peek() == &Token::Comma {
                self.bump();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        if self.peek() == &Token::Bang {
            self.bump();
            let atom = self.parse_atom()?;
            return Ok(Literal::Negation(atom));
        }
        if self.at_ident("true") {
            self.bump();
            return Ok(Literal::BooleanConstraint(true));
        }
        if self.at_ident("false") {
            self.bump();
            return Ok(Literal::BooleanConstraint(false));
        }

        let lhs = self.parse_expr(0)?;
        if let Some(op) = self.peek_comparison_op() {
            self.consume_comparison_op();
            let rhs = self.parse_expr(0)?;
            return Ok(Literal::BinaryConstraint(op, lhs, rhs));
        }

        match lhs {
            Argument::UserDefinedFunctor(name, args) => Ok(Literal::Atom(Atom::new(name, args))),
            _ => self.err_here("a relation atom or constraint"),
        }
    }

    fn peek_comparison_op(&self) -> Option<BinaryConstraintOp> {
        match self.peek() {
            Token::Eq => Some(BinaryConstraintOp::Equal),
            Token::Ne => Some(BinaryConstraintOp::NotEqual),
            Token::Lt => Some(BinaryConstraintOp::LessThan),
            Token::Le => Some(BinaryConstraintOp::LessOrEqual),
            Token::Gt => Some(BinaryConstraintOp::GreaterThan),
            Token::Ge => Some(BinaryConstraintOp::GreaterOrEqual),
            Token::Ident(s) => match s.as_str() {
                "match" => Some(BinaryConstraintOp::Match),
                "notmatch" => Some(BinaryConstraintOp::NotMatch),
                "contains" => Some(BinaryConstraintOp::Contains),
                "notcontains" => Some(BinaryConstraintOp::NotContains),
                _ => None,
            },
            _ => None,
        }
    }

    fn consume_comparison_op(&mut self) {
        self.bump();
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Argument, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, prec, right_assoc)) = self.peek_infix_op() else { break };
            if prec < min_prec {
                break;
            }
            self.consume_infix_op();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_expr(next_min)?;
            lhs = Argument::IntrinsicFunctor(op, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn peek_infix_op(&self) -> Option<(IntrinsicOp, u8, bool)> {
        match self.peek() {
            Token::Plus => Some((IntrinsicOp::Add, 5, false)),
            Token::Minus => Some((IntrinsicOp::Subtract, 5, false)),
            Token::Star => Some((IntrinsicOp::Multiply, 6, false)),
            Token::Slash => Some((IntrinsicOp::Divide, 6, false)),
            Token::Percent => Some((IntrinsicOp::Modulo, 6, false)),
            Token::Caret => Some((IntrinsicOp::Exponent, 7, true)),
            Token::Shl => Some((IntrinsicOp::ShiftLeft, 4, false)),
            Token::Shr => Some((IntrinsicOp::ShiftRight, 4, false)),
            Token::Ident(s) => match s.as_str() {
                "band" => Some((IntrinsicOp::BitAnd, 2, false)),
                "bor" => Some((IntrinsicOp::BitOr, 1, false)),
                "bxor" => Some((IntrinsicOp::BitXor, 3, false)),
                "land" => Some((IntrinsicOp::LogicalAnd, 2, false)),
                "lor" => Some((IntrinsicOp::LogicalOr, 1, false)),
                _ => None,
            },
            _ => None,
        }
    }

    fn consume_infix_op(&mut self) {
        self.bump();
    }

    fn parse_unary(&mut self) -> Result<Argument, ParseError> {
        match self.peek() {
            Token::Minus => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Argument::IntrinsicFunctor(IntrinsicOp::Negate, vec![operand]))
            }
            Token::Tilde => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Argument::IntrinsicFunctor(IntrinsicOp::BitNegate, vec![operand]))
            }
            Token::Ident(s) if s == "bnot" => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Argument::IntrinsicFunctor(IntrinsicOp::BitNegate, vec![operand]))
            }
            Token::Ident(s) if s == "lnot" => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(Argument::IntrinsicFunctor(IntrinsicOp::LogicalNegate, vec![operand]))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Argument, ParseError> {
        match self.peek().clone() {
            Token::Underscore => {
                self.bump();
                Ok(Argument::UnnamedVariable)
            }
            Token::LParen => {
                self.bump();
                let inner = self.parse_expr(0)?;
                self.expect(&Token::RParen, ")")?;
                Ok(inner)
            }
            Token::LBracket => {
                self.bump();
                let fields = self.parse_argument_list(&Token::RBracket)?;
                self.expect(&Token::RBracket, "]")?;
                Ok(Argument::RecordInit(fields))
            }
            Token::Dollar => {
                self.bump();
                if matches!(self.peek(), Token::Ident(_)) {
                    let branch = self.parse_qualified_name()?;
                    self.expect(&Token::LParen, "(")?;
                    let fields = self.parse_argument_list(&Token::RParen)?;
                    self.expect(&Token::RParen, ")")?;
                    Ok(Argument::BranchInit(branch, fields))
                } else {
                    Ok(Argument::Counter)
                }
            }
            Token::StringLit(s) => {
                self.bump();
                Ok(Argument::StringConstant(s))
            }
            Token::Number(text) => {
                let start = self.peek_spanned().clone();
                self.bump();
                let ty = self.consume_adjacent_suffix(&start, &text);
                Ok(Argument::NumericConstant(text, ty))
            }
            Token::Float(text) => {
                self.bump();
                Ok(Argument::NumericConstant(text, Some(NumericType::Float)))
            }
            Token::As => {
                self.bump();
                self.expect(&Token::LParen, "(")?;
                let inner = self.parse_expr(0)?;
                self.expect(&Token::Comma, ",")?;
                let ty = self.parse_qualified_name()?;
                self.expect(&Token::RParen, ")")?;
                Ok(Argument::TypeCast(Box::new(inner), ty))
            }
            Token::Ident(name) => self.parse_ident_led_argument(name),
            _ => self.err_here("an argument"),
        }
    }

    /// Consumes an immediately-adjacent `u` suffix (`4u`) as an unsigned
    /// marker; anything else (whitespace before the next token) leaves the
    /// constant's type for `TypeAnalysis` to infer.
    fn consume_adjacent_suffix(&mut self, start: &Spanned, text: &str) -> Option<NumericType> {
        if let Token::Ident(s) = self.peek() {
            if s == "u" {
                let adjacent_column = start.column + text.len() as u32;
                if self.peek_spanned().line == start.line && self.peek_spanned().column == adjacent_column {
                    self.bump();
                    return Some(NumericType::Uint);
                }
            }
        }
        None
    }

    fn parse_ident_led_argument(&mut self, name: String) -> Result<Argument, ParseError> {
        match name.as_str() {
            "nil" => {
                self.bump();
                Ok(Argument::NilConstant)
            }
            "count" => {
                self.bump();
                self.expect(&Token::Colon, ":")?;
                self.expect(&Token::LBrace, "{")?;
                let body = self.parse_literal_list()?;
                self.expect(&Token::RBrace, "}")?;
                Ok(Argument::Aggregator(AggregateOp::Count, None, body))
            }
            "sum" | "max" | "min" | "mean" if self.next_is_not_call() => {
                self.bump();
                let op = match name.as_str() {
                    "sum" => AggregateOp::Sum,
                    "max" => AggregateOp::Max,
                    "min" => AggregateOp::Min,
                    _ => AggregateOp::Mean,
                };
                let target = self.parse_expr(0)?;
                self.expect(&Token::Colon, ":")?;
                self.expect(&Token::LBrace, "{")?;
                let body = self.parse_literal_list()?;
                self.expect(&Token::RBrace, "}")?;
                Ok(Argument::Aggregator(op, Some(Box::new(target)), body))
            }
            _ => {
                let qname = self.parse_qualified_name()?;
                if self.peek() == &Token::LParen {
                    self.bump();
                    let args = self.parse_argument_list(&Token::RParen)?;
                    self.expect(&Token::RParen, ")")?;
                    Ok(self.build_call(qname, args))
                } else {
                    Ok(Argument::Variable(qname.to_dotted_string()))
                }
            }
        }
    }

    /// Disambiguates the aggregate keywords `sum`/`max`/`min`/`mean` from a
    /// same-named user functor call: an aggregate keyword is never itself
    /// immediately followed by `(`.
    fn next_is_not_call(&self) -> bool {
        !matches!(self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token, Token::LParen)
    }

    fn build_call(&self, name: QualifiedName, args: Vec<Argument>) -> Argument {
        if name.segments().len() == 1 {
            let intrinsic = match name.segments()[0].as_str() {
                "max" => Some(IntrinsicOp::Max),
                "min" => Some(IntrinsicOp::Min),
                "cat" => Some(IntrinsicOp::Cat),
                "ord" => Some(IntrinsicOp::Ord),
                "strlen" => Some(IntrinsicOp::StrLen),
                "substr" => Some(IntrinsicOp::Substr),
                "to_number" => Some(IntrinsicOp::ToNumber),
                "to_string" => Some(IntrinsicOp::ToString),
                _ => None,
            };
            if let Some(op) = intrinsic {
                return Argument::IntrinsicFunctor(op, args);
            }
        }
        Argument::UserDefinedFunctor(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal as AstLiteral;

    #[test]
    fn parses_a_relation_declaration_and_fact() {
        let program = parse_program(".decl edge(x:number, y:number)\nedge(1,2).").unwrap();
        assert_eq!(program.relations.len(), 1);
        assert_eq!(program.relations[0].arity(), 2);
        assert_eq!(program.clauses.len(), 1);
        assert!(program.clauses[0].is_fact());
    }

    #[test]
    fn parses_a_recursive_rule_with_negation_and_constraint() {
        let src = ".decl edge(x:number,y:number)\n.decl reach(x:number,y:number)\nreach(x,y) :- edge(x,y).\nreach(x,z) :- edge(x,y), reach(y,z), !edge(z,x), x != z.";
        let program = parse_program(src).unwrap();
        assert_eq!(program.clauses.len(), 3);
        let recursive = &program.clauses[2];
        assert_eq!(recursive.body.len(), 4);
        assert!(matches!(recursive.body[2], AstLiteral::Negation(_)));
        assert!(matches!(recursive.body[3], AstLiteral::BinaryConstraint(BinaryConstraintOp::NotEqual, ..)));
    }

    #[test]
    fn parses_io_directives_with_parameters() {
        let src = ".decl R(x:number)\n.input R(filename=\"r.facts\", delimiter=\",\")\n.output R(IO=file).";
        let program = parse_program(src).unwrap();
        assert_eq!(program.directives.len(), 2);
        assert_eq!(program.directives[0].kind, DirectiveKind::Input);
        assert_eq!(program.directives[0].get("filename"), Some("r.facts"));
    }

    #[test]
    fn parses_union_and_record_types() {
        let src = ".type Name = symbol\n.type Pair = [a: number, b: number]\n.type Shape = Circle {r: number} | Square {s: number}";
        let program = parse_program(src).unwrap();
        assert_eq!(program.types.len(), 3);
        assert!(matches!(program.types[1].kind, TypeDeclKind::Record(_)));
        assert!(matches!(program.types[2].kind, TypeDeclKind::Adt(_)));
    }

    #[test]
    fn parses_arithmetic_with_precedence() {
        let src = ".decl R(x:number)\nR(x) :- x = 1 + 2 * 3.";
        let program = parse_program(src).unwrap();
        let Literal::BinaryConstraint(BinaryConstraintOp::Equal, _, rhs) = &program.clauses[0].body[0] else {
            panic!("expected constraint")
        };
        let Argument::IntrinsicFunctor(IntrinsicOp::Add, args) = rhs else { panic!("expected add") };
        assert!(matches!(&args[1], Argument::IntrinsicFunctor(IntrinsicOp::Multiply, _)));
    }

    #[test]
    fn parses_a_component_and_instantiation() {
        let src = ".comp Graph<T> : Base<T> = {\n.decl edge(x:T, y:T)\n}\n.init g = Graph<number>.";
        let program = parse_program(src).unwrap();
        assert_eq!(program.components.len(), 1);
        assert_eq!(program.components[0].formal_type_params.len(), 1);
        assert_eq!(program.instantiations.len(), 1);
        assert_eq!(program.instantiations[0].instance_name, "g");
    }

    #[test]
    fn parses_an_aggregator_argument() {
        let src = ".decl R(x:number)\n.decl S(x:number,y:number)\nR(c) :- c = count : { S(_,_) }.";
        let program = parse_program(src).unwrap();
        let head_arg = &program.clauses[0].head.args[0];
        assert_eq!(head_arg, &Argument::Variable("c".to_string()));
    }

    #[test]
    fn reports_unexpected_token() {
        let result = parse_program(".decl R(x:number)\nR(x) :- ,.");
        assert!(result.is_err());
    }
}
