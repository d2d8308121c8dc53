//! Script parser
//!
//! Parsing runs in two passes. [`lines`] splits the source into logical lines
//! and measures their indentation; each line is then parsed with the PEST
//! grammar and blocks are rebuilt from the indentation widths.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::Once;

use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::types::ast::{
    Arg, BinOp, BoolOp, CmpOp, CompClause, Comprehension, ExceptHandler, Expr, FStringPart, Param,
    Stmt, UnaryOp,
};
use lines::{logical_lines, LogicalLine};
use strings::{Literal, RawPart};

pub mod lines;
pub mod semantic_validator;
mod strings;

#[cfg(test)]
mod tests;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/python.pest"]
struct ScriptParser;

/// Grammar rule invocations allowed while parsing one line
const MAX_PARSE_CALLS: usize = 50_000_000;

/// Depth of grammar nodes allowed in one line; the AST builder and the
/// evaluator both recurse this deep
const MAX_NESTING: usize = 4000;

const TOO_COMPLEX: &str = "Parser stack overflowed - Python source too complex to parse";

static PARSE_LIMITS: Once = Once::new();

fn run_parser(rule: Rule, text: &str) -> Result<Pairs<'_, Rule>, pest::error::Error<Rule>> {
    PARSE_LIMITS.call_once(|| pest::set_call_limit(NonZeroUsize::new(MAX_PARSE_CALLS)));
    ScriptParser::parse(rule, text)
}

/// Deepest node under `root`, counted without recursing
fn nesting_depth(root: &Pair<'_, Rule>) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(root.clone(), 1)];
    while let Some((pair, depth)) = pending.pop() {
        deepest = deepest.max(depth);
        pending.extend(pair.into_inner().map(|child| (child, depth + 1)));
    }
    deepest
}

fn check_nesting(root: &Pair<'_, Rule>, line: usize) -> ParseResult<()> {
    if nesting_depth(root) > MAX_NESTING {
        return Err(ParseError::syntax(TOO_COMPLEX, line));
    }
    Ok(())
}

/* ===================== Error Types ===================== */

/// Error raised while turning source text into an AST
///
/// The display form mirrors the interpreter convention of naming the source
/// `<string>`, e.g. `invalid syntax (<string>, line 3)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{message} (<string>, line {line})")]
    Syntax { message: String, line: usize },
    #[error("{message} (<string>, line {line})")]
    Indentation { message: String, line: usize },
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line,
        }
    }

    pub fn indentation(message: impl Into<String>, line: usize) -> Self {
        ParseError::Indentation {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. } | ParseError::Indentation { line, .. } => *line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } | ParseError::Indentation { message, .. } => message,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

fn pest_error(err: pest::error::Error<Rule>, line: &LogicalLine) -> ParseError {
    // Custom errors only come from the parser's call and stack limits
    if let ErrorVariant::CustomError { .. } = err.variant {
        return ParseError::syntax(TOO_COMPLEX, line.line);
    }
    let offset = match err.line_col {
        LineColLocation::Pos((l, _)) | LineColLocation::Span((l, _), _) => l,
    };
    ParseError::syntax("invalid syntax", line.line + offset.saturating_sub(1))
}

/* ===================== Public API ===================== */

/// Parse a whole source file into its top-level statements
pub fn parse_module(source: &str) -> ParseResult<Vec<Stmt>> {
    let lines = logical_lines(source)?;
    let mut builder = BlockBuilder::new(&lines, source.lines().count().max(1));
    builder.parse_block(0)
}

/* ===================== Block Builder ===================== */

/// Tracks where `break` and `continue` are legal
#[derive(Debug, Default)]
struct ParserContext {
    loop_depth: usize,
}

impl ParserContext {
    fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    fn exit_loop(&mut self) {
        self.loop_depth -= 1;
    }

    fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    /// Function bodies start outside any loop
    fn enter_function(&mut self) -> usize {
        std::mem::take(&mut self.loop_depth)
    }

    fn exit_function(&mut self, saved: usize) {
        self.loop_depth = saved;
    }
}

struct BlockBuilder<'a> {
    lines: &'a [LogicalLine],
    pos: usize,
    ctx: ParserContext,
    /// Last physical line, where errors found at end of input are reported
    last_line: usize,
}

impl<'a> BlockBuilder<'a> {
    fn new(lines: &'a [LogicalLine], last_line: usize) -> Self {
        BlockBuilder {
            lines,
            pos: 0,
            ctx: ParserContext::default(),
            last_line,
        }
    }

    fn peek(&self) -> Option<&'a LogicalLine> {
        let lines = self.lines;
        lines.get(self.pos)
    }

    /// Next line, if it sits at `indent` and opens with `keyword`
    fn next_clause(&self, indent: usize, keyword: &str) -> Option<&'a LogicalLine> {
        self.peek()
            .filter(|l| l.indent == indent && starts_with_keyword(&l.text, keyword))
    }

    /// Parse consecutive statements indented exactly `indent` columns
    fn parse_block(&mut self, indent: usize) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        let mut after_compound = false;

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                let message = if after_compound {
                    "unindent does not match any outer indentation level"
                } else {
                    "unexpected indent"
                };
                return Err(ParseError::indentation(message, line.line));
            }
            let (stmts, compound) = self.parse_statement()?;
            body.extend(stmts);
            after_compound = compound;
        }

        Ok(body)
    }

    /// Parse the statement starting at the current line, including any
    /// nested block and trailing clauses
    fn parse_statement(&mut self) -> ParseResult<(Vec<Stmt>, bool)> {
        let lines = self.lines;
        let line = &lines[self.pos];
        self.pos += 1;

        let pair = parse_line(line)?;
        match pair.as_rule() {
            Rule::simple_stmts => Ok((self.build_simple_stmts(pair, line.line)?, false)),
            Rule::unsupported_stmt => {
                let keyword = pair
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                Err(ParseError::syntax(
                    format!("'{}' statements are not supported", keyword),
                    line.line,
                ))
            }
            Rule::def_header => Ok((vec![self.build_def(pair, line)?], true)),
            Rule::if_header => Ok((vec![self.build_if(pair, line)?], true)),
            Rule::while_header => Ok((vec![self.build_while(pair, line)?], true)),
            Rule::for_header => Ok((vec![self.build_for(pair, line)?], true)),
            Rule::try_header => Ok((vec![self.build_try(pair, line)?], true)),
            // elif/else/except/finally with nothing to attach to
            _ => Err(ParseError::syntax("invalid syntax", line.line)),
        }
    }

    /// Body of a compound statement: either the statements after its colon or
    /// the indented block on the following lines
    fn parse_suite(
        &mut self,
        header: &LogicalLine,
        inline: Option<Pair<'a, Rule>>,
        what: &str,
    ) -> ParseResult<Vec<Stmt>> {
        if let Some(stmts) = inline {
            return self.build_simple_stmts(stmts, header.line);
        }
        match self.peek() {
            Some(next) if next.indent > header.indent => self.parse_block(next.indent),
            next => Err(ParseError::indentation(
                format!("expected an indented block after {} on line {}", what, header.line),
                next.map_or(self.last_line, |l| l.line),
            )),
        }
    }

    fn build_def(&mut self, pair: Pair<'a, Rule>, line: &'a LogicalLine) -> ParseResult<Stmt> {
        // def_header = { kw_def ~ identifier ~ "(" ~ param_list? ~ ")" ~ ":" ~ simple_stmts? }
        let (parts, inline) = header_parts(pair);
        let mut parts = parts.into_iter();
        let name = expect(parts.next(), line.line)?.as_str().to_string();
        let params = match parts.next() {
            Some(list) => build_params(list, line.line)?,
            None => Vec::new(),
        };

        let saved = self.ctx.enter_function();
        let body = self.parse_suite(line, inline, "function definition");
        self.ctx.exit_function(saved);

        let def = semantic_validator::function_def(name, params, body?, line.line)?;
        Ok(Stmt::FunctionDef(Rc::new(def)))
    }

    fn build_if(&mut self, pair: Pair<'a, Rule>, line: &'a LogicalLine) -> ParseResult<Stmt> {
        // if_header = { kw_if ~ expression ~ ":" ~ simple_stmts? }
        let (parts, inline) = header_parts(pair);
        let test = build_expression(single(parts, line.line)?, line.line)?;
        let then_s = self.parse_suite(line, inline, "'if' statement")?;
        let else_s = self.parse_elif_chain(line.indent)?;
        Ok(Stmt::If {
            test,
            then_s,
            else_s,
        })
    }

    /// `elif` clauses become a nested `if` in the else branch
    fn parse_elif_chain(&mut self, indent: usize) -> ParseResult<Vec<Stmt>> {
        let Some(line) = self.next_clause(indent, "elif") else {
            return self.parse_else(indent);
        };
        self.pos += 1;

        let pair = expect_rule(parse_line(line)?, Rule::elif_header, line.line)?;
        let (parts, inline) = header_parts(pair);
        let test = build_expression(single(parts, line.line)?, line.line)?;
        let then_s = self.parse_suite(line, inline, "'elif' statement")?;
        let else_s = self.parse_elif_chain(indent)?;

        Ok(vec![Stmt::If {
            test,
            then_s,
            else_s,
        }])
    }

    fn parse_else(&mut self, indent: usize) -> ParseResult<Vec<Stmt>> {
        let Some(line) = self.next_clause(indent, "else") else {
            return Ok(Vec::new());
        };
        self.pos += 1;

        let pair = expect_rule(parse_line(line)?, Rule::else_header, line.line)?;
        let (_, inline) = header_parts(pair);
        self.parse_suite(line, inline, "'else' statement")
    }

    fn build_while(&mut self, pair: Pair<'a, Rule>, line: &'a LogicalLine) -> ParseResult<Stmt> {
        // while_header = { kw_while ~ expression ~ ":" ~ simple_stmts? }
        let (parts, inline) = header_parts(pair);
        let test = build_expression(single(parts, line.line)?, line.line)?;

        self.ctx.enter_loop();
        let body = self.parse_suite(line, inline, "'while' statement");
        self.ctx.exit_loop();

        let body = body?;
        let orelse = self.parse_else(line.indent)?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn build_for(&mut self, pair: Pair<'a, Rule>, line: &'a LogicalLine) -> ParseResult<Stmt> {
        // for_header = { kw_for ~ target_list ~ kw_in ~ expression_list ~ ":" ~ simple_stmts? }
        let (parts, inline) = header_parts(pair);
        let mut parts = parts.into_iter();
        let target = build_expression(expect(parts.next(), line.line)?, line.line)?;
        check_target(&target, line.line, false)?;
        let iter = build_expression(expect(parts.next(), line.line)?, line.line)?;

        self.ctx.enter_loop();
        let body = self.parse_suite(line, inline, "'for' statement");
        self.ctx.exit_loop();

        let body = body?;
        let orelse = self.parse_else(line.indent)?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    fn build_try(&mut self, pair: Pair<'a, Rule>, line: &'a LogicalLine) -> ParseResult<Stmt> {
        // try_header = { kw_try ~ ":" ~ simple_stmts? }
        let (_, inline) = header_parts(pair);
        let body = self.parse_suite(line, inline, "'try' statement")?;

        let mut handlers: Vec<ExceptHandler> = Vec::new();
        while let Some(clause) = self.next_clause(line.indent, "except") {
            self.pos += 1;
            if handlers.last().is_some_and(|h| h.kind.is_none()) {
                return Err(ParseError::syntax("default 'except:' must be last", clause.line));
            }

            // except_header = { kw_except ~ (expression ~ (kw_as ~ identifier)?)? ~ ":" ~ simple_stmts? }
            let pair = expect_rule(parse_line(clause)?, Rule::except_header, clause.line)?;
            let (parts, inline) = header_parts(pair);
            let mut parts = parts.into_iter();
            let kind = parts
                .next()
                .map(|p| build_expression(p, clause.line))
                .transpose()?;
            let name = parts.next().map(|p| p.as_str().to_string());
            let body = self.parse_suite(clause, inline, "'except' statement")?;
            handlers.push(ExceptHandler { kind, name, body });
        }

        let orelse = if handlers.is_empty() {
            Vec::new()
        } else {
            self.parse_else(line.indent)?
        };

        let finalbody = match self.next_clause(line.indent, "finally") {
            Some(clause) => {
                self.pos += 1;
                let pair = expect_rule(parse_line(clause)?, Rule::finally_header, clause.line)?;
                let (_, inline) = header_parts(pair);
                Some(self.parse_suite(clause, inline, "'finally' statement")?)
            }
            None => None,
        };

        if handlers.is_empty() && finalbody.is_none() {
            return Err(ParseError::syntax(
                "expected 'except' or 'finally' block",
                self.peek().map(|l| l.line).unwrap_or(line.line + 1),
            ));
        }

        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody: finalbody.unwrap_or_default(),
        })
    }

    /* ===================== Simple Statements ===================== */

    fn build_simple_stmts(&self, pair: Pair<'_, Rule>, line: usize) -> ParseResult<Vec<Stmt>> {
        // simple_stmts = { simple_stmt ~ (";" ~ simple_stmt)* ~ ";"? }
        pair.into_inner()
            .map(|stmt| self.build_simple_stmt(stmt, line))
            .collect()
    }

    fn build_simple_stmt(&self, pair: Pair<'_, Rule>, line: usize) -> ParseResult<Stmt> {
        match pair.as_rule() {
            Rule::pass_stmt => Ok(Stmt::Pass),
            Rule::break_stmt if self.ctx.in_loop() => Ok(Stmt::Break),
            Rule::break_stmt => Err(ParseError::syntax("'break' outside loop", line)),
            Rule::continue_stmt if self.ctx.in_loop() => Ok(Stmt::Continue),
            Rule::continue_stmt => Err(ParseError::syntax("'continue' not properly in loop", line)),
            Rule::return_stmt => {
                let value = significant(pair)
                    .into_iter()
                    .next()
                    .map(|p| build_expression(p, line))
                    .transpose()?;
                Ok(Stmt::Return { value })
            }
            Rule::raise_stmt => {
                let exc = significant(pair)
                    .into_iter()
                    .next()
                    .map(|p| build_expression(p, line))
                    .transpose()?;
                Ok(Stmt::Raise { exc })
            }
            Rule::global_stmt => {
                let names = significant(pair)
                    .into_iter()
                    .map(|p| p.as_str().to_string())
                    .collect();
                Ok(Stmt::Global { names })
            }
            Rule::del_stmt => {
                // del_stmt = { kw_del ~ expression_list }
                let list = single(significant(pair), line)?;
                let targets = expression_items(list, line)?;
                for target in &targets {
                    check_deletable(target, line)?;
                }
                Ok(Stmt::Delete { targets })
            }
            Rule::assert_stmt => {
                let mut parts = significant(pair).into_iter();
                let test = build_expression(expect(parts.next(), line)?, line)?;
                let msg = parts.next().map(|p| build_expression(p, line)).transpose()?;
                Ok(Stmt::Assert { test, msg })
            }
            Rule::assign_stmt => {
                // assign_stmt = { expression_list ~ ("=" ~ expression_list)+ }
                let mut exprs = pair
                    .into_inner()
                    .map(|p| build_expression(p, line))
                    .collect::<ParseResult<Vec<_>>>()?;
                let value = exprs
                    .pop()
                    .ok_or_else(|| ParseError::syntax("invalid syntax", line))?;
                for target in &exprs {
                    check_target(target, line, true)?;
                }
                Ok(Stmt::Assign {
                    targets: exprs,
                    value,
                })
            }
            Rule::aug_assign_stmt => {
                // aug_assign_stmt = { expression ~ aug_op ~ expression_list }
                let mut parts = pair.into_inner();
                let target = build_expression(expect(parts.next(), line)?, line)?;
                if !matches!(
                    target,
                    Expr::Name { .. } | Expr::Subscript { .. } | Expr::Attribute { .. }
                ) {
                    return Err(ParseError::syntax(
                        format!(
                            "'{}' is an illegal expression for augmented assignment",
                            describe(&target)
                        ),
                        line,
                    ));
                }
                let op_text = expect(parts.next(), line)?.as_str();
                let op = binary_op(op_text.trim_end_matches('='), line)?;
                let value = build_expression(expect(parts.next(), line)?, line)?;
                Ok(Stmt::AugAssign { target, op, value })
            }
            Rule::expr_stmt => {
                let expr = build_expression(single(pair.into_inner().collect(), line)?, line)?;
                Ok(Stmt::Expr { expr })
            }
            other => Err(ParseError::syntax(
                format!("unexpected statement {:?}", other),
                line,
            )),
        }
    }
}

/* ===================== Pair Helpers ===================== */

fn parse_line(line: &LogicalLine) -> ParseResult<Pair<'_, Rule>> {
    let mut pairs =
        run_parser(Rule::line, &line.text).map_err(|err| pest_error(err, line))?;
    let root = expect(pairs.next(), line.line)?;
    check_nesting(&root, line.line)?;
    root.into_inner()
        .next()
        .filter(|p| p.as_rule() != Rule::EOI)
        .ok_or_else(|| ParseError::syntax("invalid syntax", line.line))
}

fn expect<'i>(pair: Option<Pair<'i, Rule>>, line: usize) -> ParseResult<Pair<'i, Rule>> {
    pair.ok_or_else(|| ParseError::syntax("invalid syntax", line))
}

fn expect_rule<'i>(pair: Pair<'i, Rule>, rule: Rule, line: usize) -> ParseResult<Pair<'i, Rule>> {
    if pair.as_rule() == rule {
        Ok(pair)
    } else {
        Err(ParseError::syntax("invalid syntax", line))
    }
}

fn single<'i>(parts: Vec<Pair<'i, Rule>>, line: usize) -> ParseResult<Pair<'i, Rule>> {
    expect(parts.into_iter().next(), line)
}

fn first_child(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Pair<'_, Rule>> {
    expect(pair.into_inner().next(), line)
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_and
            | Rule::kw_as
            | Rule::kw_assert
            | Rule::kw_break
            | Rule::kw_continue
            | Rule::kw_def
            | Rule::kw_del
            | Rule::kw_elif
            | Rule::kw_else
            | Rule::kw_except
            | Rule::kw_false
            | Rule::kw_finally
            | Rule::kw_for
            | Rule::kw_global
            | Rule::kw_if
            | Rule::kw_in
            | Rule::kw_is
            | Rule::kw_lambda
            | Rule::kw_none
            | Rule::kw_not
            | Rule::kw_or
            | Rule::kw_pass
            | Rule::kw_raise
            | Rule::kw_return
            | Rule::kw_true
            | Rule::kw_try
            | Rule::kw_while
    )
}

/// Children of `pair` with keyword tokens dropped
fn significant(pair: Pair<'_, Rule>) -> Vec<Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule())).collect()
}

/// Split a compound header into its parts and the inline body, if any
fn header_parts(pair: Pair<'_, Rule>) -> (Vec<Pair<'_, Rule>>, Option<Pair<'_, Rule>>) {
    let mut parts = significant(pair);
    let inline = if parts.last().map(|p| p.as_rule()) == Some(Rule::simple_stmts) {
        parts.pop()
    } else {
        None
    };
    (parts, inline)
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/* ===================== Targets ===================== */

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Call { .. } => "function call",
        Expr::LitNone => "None",
        Expr::LitBool { v: true } => "True",
        Expr::LitBool { v: false } => "False",
        Expr::LitInt { .. } | Expr::LitFloat { .. } | Expr::LitStr { .. } => "literal",
        Expr::FString { .. } => "f-string expression",
        Expr::Compare { .. } => "comparison",
        Expr::IfExp { .. } => "conditional expression",
        Expr::Lambda(_) => "lambda",
        Expr::ListComp { .. } => "list comprehension",
        Expr::DictComp { .. } => "dict comprehension",
        Expr::GenExp { .. } => "generator expression",
        Expr::Dict { .. } => "dict literal",
        Expr::Name { .. } => "name",
        Expr::Attribute { .. } => "attribute",
        Expr::Subscript { .. } => "subscript",
        Expr::Tuple { .. } => "tuple",
        Expr::List { .. } => "list",
        _ => "expression",
    }
}

/// Reject assignment targets other than names, subscripts, attributes and
/// (nested) tuples or lists of those
fn check_target(expr: &Expr, line: usize, in_assignment: bool) -> ParseResult<()> {
    match expr {
        Expr::Name { .. } | Expr::Subscript { .. } | Expr::Attribute { .. } => Ok(()),
        Expr::Tuple { items } | Expr::List { items } => items
            .iter()
            .try_for_each(|item| check_target(item, line, in_assignment)),
        other => {
            let suffix = if in_assignment {
                " here. Maybe you meant '==' instead of '='?"
            } else {
                ""
            };
            Err(ParseError::syntax(
                format!("cannot assign to {}{}", describe(other), suffix),
                line,
            ))
        }
    }
}

fn check_deletable(expr: &Expr, line: usize) -> ParseResult<()> {
    match expr {
        Expr::Name { .. } | Expr::Subscript { .. } | Expr::Attribute { .. } => Ok(()),
        Expr::Tuple { items } | Expr::List { items } => {
            items.iter().try_for_each(|item| check_deletable(item, line))
        }
        other => Err(ParseError::syntax(
            format!("cannot delete {}", describe(other)),
            line,
        )),
    }
}

/* ===================== Expressions ===================== */

fn build_expression(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::expression => build_expression(first_child(pair, line)?, line),
        Rule::expression_list | Rule::target_list => build_expression_list(pair, line),
        Rule::target => {
            // target = { "(" ~ target_list ~ ")" | "[" ~ target_list ~ "]" | postfix }
            build_expression(first_child(pair, line)?, line)
        }
        Rule::lambda_expr => build_lambda(pair, line),
        Rule::conditional => {
            // conditional = { or_test ~ (kw_if ~ or_test ~ kw_else ~ expression)? }
            let mut parts = significant(pair).into_iter();
            let body = build_expression(expect(parts.next(), line)?, line)?;
            match (parts.next(), parts.next()) {
                (Some(test), Some(orelse)) => Ok(Expr::IfExp {
                    test: Box::new(build_expression(test, line)?),
                    body: Box::new(body),
                    orelse: Box::new(build_expression(orelse, line)?),
                }),
                _ => Ok(body),
            }
        }
        Rule::or_test => build_bool_chain(pair, BoolOp::Or, line),
        Rule::and_test => build_bool_chain(pair, BoolOp::And, line),
        Rule::not_test => {
            // not_test = { kw_not ~ not_test | comparison }
            let inner = single(significant(pair), line)?;
            if inner.as_rule() == Rule::not_test {
                Ok(Expr::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(build_expression(inner, line)?),
                })
            } else {
                build_expression(inner, line)
            }
        }
        Rule::comparison => {
            // comparison = { bit_or ~ (comp_op ~ bit_or)* }
            let mut parts = pair.into_inner();
            let left = build_expression(expect(parts.next(), line)?, line)?;
            let mut ops = Vec::new();
            while let Some(op) = parts.next() {
                let right = build_expression(expect(parts.next(), line)?, line)?;
                ops.push((comparison_op(op, line)?, right));
            }
            if ops.is_empty() {
                Ok(left)
            } else {
                Ok(Expr::Compare {
                    left: Box::new(left),
                    ops,
                })
            }
        }
        Rule::bit_or | Rule::bit_xor | Rule::bit_and | Rule::shift | Rule::arith | Rule::term => {
            build_binary_chain(pair, line)
        }
        Rule::factor => {
            // factor = { unary_op ~ factor | power }
            let mut parts = pair.into_inner();
            let first = expect(parts.next(), line)?;
            if first.as_rule() != Rule::unary_op {
                return build_expression(first, line);
            }
            let op = match first.as_str() {
                "-" => UnaryOp::Neg,
                "+" => UnaryOp::Pos,
                _ => UnaryOp::Invert,
            };
            let operand = build_expression(expect(parts.next(), line)?, line)?;
            Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            })
        }
        Rule::power => {
            // power = { postfix ~ ("**" ~ factor)? }
            let mut parts = pair.into_inner();
            let base = build_expression(expect(parts.next(), line)?, line)?;
            match parts.next() {
                Some(exponent) => Ok(Expr::BinOp {
                    op: BinOp::Pow,
                    left: Box::new(base),
                    right: Box::new(build_expression(exponent, line)?),
                }),
                None => Ok(base),
            }
        }
        Rule::postfix => build_postfix(pair, line),
        Rule::paren_expr => {
            // paren_expr = { "(" ~ (expression ~ (comp_tail | expression_tail))? ~ ")" }
            let parts: Vec<_> = pair.into_inner().collect();
            if ends_with_comprehension(&parts) {
                let (elt, comp) = build_comprehension_parts(parts, line)?;
                return Ok(Expr::GenExp {
                    elt: Rc::new(build_expression(elt, line)?),
                    comp,
                });
            }
            if parts.is_empty() {
                return Ok(Expr::Tuple { items: Vec::new() });
            }
            build_sequence(parts, line)
        }
        Rule::list_display => {
            // list_display = { "[" ~ (expression ~ (comp_tail | expression_tail))? ~ "]" }
            let parts: Vec<_> = pair.into_inner().collect();
            if ends_with_comprehension(&parts) {
                let (elt, comp) = build_comprehension_parts(parts, line)?;
                return Ok(Expr::ListComp {
                    elt: Box::new(build_expression(elt, line)?),
                    comp,
                });
            }
            Ok(Expr::List {
                items: sequence_items(parts, line)?,
            })
        }
        Rule::dict_display => build_dict(pair, line),
        Rule::strings => build_strings(pair, line),
        Rule::dec_int => parse_decimal(pair.as_str(), line),
        Rule::hex_int => parse_radix(&pair.as_str()[2..], 16, line),
        Rule::bin_int => parse_radix(&pair.as_str()[2..], 2, line),
        Rule::oct_int => parse_radix(&pair.as_str()[2..], 8, line),
        Rule::float_lit => {
            let text = pair.as_str().replace('_', "");
            let v = text
                .parse::<f64>()
                .map_err(|_| ParseError::syntax(format!("invalid float literal '{}'", text), line))?;
            Ok(Expr::LitFloat { v })
        }
        Rule::none_lit => Ok(Expr::LitNone),
        Rule::true_lit => Ok(Expr::LitBool { v: true }),
        Rule::false_lit => Ok(Expr::LitBool { v: false }),
        Rule::identifier => Ok(Expr::Name {
            name: pair.as_str().to_string(),
        }),
        other => Err(ParseError::syntax(
            format!("unexpected expression {:?}", other),
            line,
        )),
    }
}

fn build_expression_list(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    build_sequence(pair.into_inner(), line)
}

/// `a, b` is a tuple; a lone expression without a comma is itself
fn build_sequence<'i>(
    children: impl IntoIterator<Item = Pair<'i, Rule>>,
    line: usize,
) -> ParseResult<Expr> {
    let mut has_comma = false;
    let mut items = Vec::new();
    for child in children {
        if child.as_rule() == Rule::comma {
            has_comma = true;
        } else {
            items.push(build_expression(child, line)?);
        }
    }
    if has_comma {
        Ok(Expr::Tuple { items })
    } else {
        items
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::syntax("invalid syntax", line))
    }
}

/// Items of an expression list, whether or not it has commas
fn expression_items(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Vec<Expr>> {
    sequence_items(pair.into_inner(), line)
}

fn sequence_items<'i>(
    children: impl IntoIterator<Item = Pair<'i, Rule>>,
    line: usize,
) -> ParseResult<Vec<Expr>> {
    children
        .into_iter()
        .filter(|p| p.as_rule() != Rule::comma)
        .map(|p| build_expression(p, line))
        .collect()
}

fn build_bool_chain(pair: Pair<'_, Rule>, op: BoolOp, line: usize) -> ParseResult<Expr> {
    let mut parts = significant(pair).into_iter();
    let mut expr = build_expression(expect(parts.next(), line)?, line)?;
    for operand in parts {
        expr = Expr::BoolOp {
            op,
            left: Box::new(expr),
            right: Box::new(build_expression(operand, line)?),
        };
    }
    Ok(expr)
}

/// Left-associative chain `operand (op operand)*`
fn build_binary_chain(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    let mut parts = pair.into_inner();
    let mut expr = build_expression(expect(parts.next(), line)?, line)?;
    while let Some(op) = parts.next() {
        let op = binary_op(op.as_str().trim(), line)?;
        let right = build_expression(expect(parts.next(), line)?, line)?;
        expr = Expr::BinOp {
            op,
            left: Box::new(expr),
            right: Box::new(right),
        };
    }
    Ok(expr)
}

fn binary_op(symbol: &str, line: usize) -> ParseResult<BinOp> {
    let op = match symbol {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "//" => BinOp::FloorDiv,
        "%" => BinOp::Mod,
        "**" => BinOp::Pow,
        "|" => BinOp::BitOr,
        "^" => BinOp::BitXor,
        "&" => BinOp::BitAnd,
        "<<" => BinOp::LShift,
        ">>" => BinOp::RShift,
        other => {
            return Err(ParseError::syntax(
                format!("unknown operator '{}'", other),
                line,
            ))
        }
    };
    Ok(op)
}

fn comparison_op(pair: Pair<'_, Rule>, line: usize) -> ParseResult<CmpOp> {
    // comp_op = { "==" | "!=" | "<=" | ">=" | "<" | ">" | not_in | is_not | kw_in | kw_is }
    let text = pair.as_str();
    let op = match pair.into_inner().next().map(|p| p.as_rule()) {
        Some(Rule::not_in) => CmpOp::NotIn,
        Some(Rule::is_not) => CmpOp::IsNot,
        Some(Rule::kw_in) => CmpOp::In,
        Some(Rule::kw_is) => CmpOp::Is,
        _ => match text {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtE,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtE,
            other => {
                return Err(ParseError::syntax(
                    format!("unknown comparison '{}'", other),
                    line,
                ))
            }
        },
    };
    Ok(op)
}

fn build_postfix(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    // postfix = { atom ~ (call | subscript | attribute)* }
    let mut parts = pair.into_inner();
    let mut expr = build_expression(expect(parts.next(), line)?, line)?;

    for trailer in parts {
        expr = match trailer.as_rule() {
            Rule::call => Expr::Call {
                func: Box::new(expr),
                args: build_call_args(trailer, line)?,
            },
            Rule::subscript => Expr::Subscript {
                value: Box::new(expr),
                index: Box::new(build_index(trailer, line)?),
            },
            Rule::attribute => Expr::Attribute {
                value: Box::new(expr),
                attr: first_child(trailer, line)?.as_str().to_string(),
            },
            other => {
                return Err(ParseError::syntax(
                    format!("unexpected trailer {:?}", other),
                    line,
                ))
            }
        };
    }

    Ok(expr)
}

fn build_call_args(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Vec<Arg>> {
    // call = { "(" ~ (argument ~ (comp_tail | arg_tail))? ~ ")" }
    let parts: Vec<_> = pair.into_inner().collect();
    if ends_with_comprehension(&parts) {
        let (elt, comp) = build_comprehension_parts(parts, line)?;
        if matches!(elt.as_rule(), Rule::kwarg | Rule::star_arg) {
            return Err(ParseError::syntax("invalid syntax", line));
        }
        return Ok(vec![Arg::Positional(Expr::GenExp {
            elt: Rc::new(build_expression(elt, line)?),
            comp,
        })]);
    }

    let mut args = Vec::new();
    let mut keywords = HashSet::new();
    for arg in parts {
        match arg.as_rule() {
            Rule::kwarg => {
                let mut parts = arg.into_inner();
                let name = expect(parts.next(), line)?.as_str().to_string();
                if !keywords.insert(name.clone()) {
                    return Err(ParseError::syntax(
                        format!("keyword argument repeated: {}", name),
                        line,
                    ));
                }
                let value = build_expression(expect(parts.next(), line)?, line)?;
                args.push(Arg::Keyword(name, value));
            }
            Rule::star_arg => {
                args.push(Arg::Star(build_expression(first_child(arg, line)?, line)?));
            }
            _ => {
                if !keywords.is_empty() {
                    return Err(ParseError::syntax(
                        "positional argument follows keyword argument",
                        line,
                    ));
                }
                args.push(Arg::Positional(build_expression(arg, line)?));
            }
        }
    }

    Ok(args)
}

fn build_index(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    // subscript = { "[" ~ (expression ~ (slice_tail | expression_tail) | slice_tail) ~ "]" }
    let mut parts: Vec<_> = pair.into_inner().collect();
    if parts.last().map(|p| p.as_rule()) != Some(Rule::slice_tail) {
        return build_sequence(parts, line);
    }

    let tail = expect(parts.pop(), line)?;
    let lower = match parts.pop() {
        Some(expr) => Some(Box::new(build_expression(expr, line)?)),
        None => None,
    };
    let (mut upper, mut step) = (None, None);
    for part in tail.into_inner() {
        let rule = part.as_rule();
        let expr = Some(Box::new(build_expression(first_child(part, line)?, line)?));
        match rule {
            Rule::slice_upper => upper = expr,
            _ => step = expr,
        }
    }
    Ok(Expr::Slice { lower, upper, step })
}

fn build_dict(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    // dict_display = { "{" ~ (dict_item ~ (comp_tail | dict_tail))? ~ "}" }
    let parts: Vec<_> = pair.into_inner().collect();
    let build_item = |item: Pair<'_, Rule>| -> ParseResult<(Expr, Expr)> {
        let mut kv = item.into_inner();
        let key = build_expression(expect(kv.next(), line)?, line)?;
        let value = build_expression(expect(kv.next(), line)?, line)?;
        Ok((key, value))
    };

    if ends_with_comprehension(&parts) {
        let (item, comp) = build_comprehension_parts(parts, line)?;
        let (key, value) = build_item(item)?;
        return Ok(Expr::DictComp {
            key: Box::new(key),
            value: Box::new(value),
            comp,
        });
    }

    let items = parts
        .into_iter()
        .map(build_item)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Expr::Dict { items })
}

fn ends_with_comprehension(parts: &[Pair<'_, Rule>]) -> bool {
    parts.last().map(|p| p.as_rule()) == Some(Rule::comp_tail)
}

/// Splits `[item, comp_tail]` into the leading item and its clauses
fn build_comprehension_parts<'i>(
    parts: Vec<Pair<'i, Rule>>,
    line: usize,
) -> ParseResult<(Pair<'i, Rule>, Rc<Comprehension>)> {
    let mut parts = parts.into_iter();
    let item = expect(parts.next(), line)?;
    let tail = expect(parts.next(), line)?;
    Ok((item, build_comprehension(tail.into_inner(), line)?))
}

fn build_comprehension<'i>(
    clauses: impl Iterator<Item = Pair<'i, Rule>>,
    line: usize,
) -> ParseResult<Rc<Comprehension>> {
    let mut built = Vec::new();
    let mut locals = HashSet::new();

    for clause in clauses {
        match clause.as_rule() {
            Rule::comp_for => {
                // comp_for = { kw_for ~ target_list ~ kw_in ~ or_test }
                let mut parts = significant(clause).into_iter();
                let target = build_expression(expect(parts.next(), line)?, line)?;
                check_target(&target, line, false)?;
                semantic_validator::target_names(&target, &mut locals);
                let iter = build_expression(expect(parts.next(), line)?, line)?;
                built.push(CompClause::For { target, iter });
            }
            _ => {
                let test = build_expression(single(significant(clause), line)?, line)?;
                built.push(CompClause::If { test });
            }
        }
    }

    Ok(Rc::new(Comprehension {
        clauses: built,
        locals,
    }))
}

fn build_lambda(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    // lambda_expr = { kw_lambda ~ param_list? ~ ":" ~ expression }
    let mut parts = significant(pair).into_iter();
    let first = expect(parts.next(), line)?;
    let (params, body) = if first.as_rule() == Rule::param_list {
        (build_params(first, line)?, expect(parts.next(), line)?)
    } else {
        (Vec::new(), first)
    };
    let body = vec![Stmt::Return {
        value: Some(build_expression(body, line)?),
    }];
    let def = semantic_validator::function_def("<lambda>".to_string(), params, body, line)?;
    Ok(Expr::Lambda(Rc::new(def)))
}

fn build_params(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Vec<Param>> {
    // param_list = { param ~ ("," ~ param)* ~ ","? }
    let mut params = Vec::new();
    let mut seen = HashSet::new();
    let mut seen_default = false;

    for param in pair.into_inner() {
        let mut parts = param.into_inner();
        let name = expect(parts.next(), line)?.as_str().to_string();
        if !seen.insert(name.clone()) {
            return Err(ParseError::syntax(
                format!("duplicate argument '{}' in function definition", name),
                line,
            ));
        }
        let default = parts.next().map(|p| build_expression(p, line)).transpose()?;
        if default.is_some() {
            seen_default = true;
        } else if seen_default {
            return Err(ParseError::syntax(
                "parameter without a default follows parameter with a default",
                line,
            ));
        }
        params.push(Param { name, default });
    }

    Ok(params)
}

/* ===================== Literals ===================== */

fn build_strings(pair: Pair<'_, Rule>, line: usize) -> ParseResult<Expr> {
    // strings = { (fstring | string_lit)+ }, adjacent literals concatenate
    let mut parts: Vec<FStringPart> = Vec::new();
    let mut formatted = false;

    for piece in pair.into_inner() {
        match strings::decode_literal(piece.as_str(), line)? {
            Literal::Plain(text) => push_text(&mut parts, text),
            Literal::Formatted(raw) => {
                formatted = true;
                build_fstring_parts(raw, &mut parts, line)?;
            }
        }
    }

    if formatted {
        return Ok(Expr::FString { parts });
    }
    let v = parts
        .into_iter()
        .map(|part| match part {
            FStringPart::Literal(text) => text,
            FStringPart::Field { .. } => String::new(),
        })
        .collect();
    Ok(Expr::LitStr { v })
}

fn build_fstring_parts(
    raw: Vec<RawPart>,
    parts: &mut Vec<FStringPart>,
    line: usize,
) -> ParseResult<()> {
    for part in raw {
        match part {
            RawPart::Text(text) => push_text(parts, text),
            RawPart::Field {
                source,
                conversion,
                spec,
            } => {
                // Braces in a spec are nested replacement fields
                let mut spec_parts = Vec::new();
                if spec.contains(['{', '}']) {
                    let nested = strings::split_fstring(&spec, line)?;
                    build_fstring_parts(nested, &mut spec_parts, line)?;
                } else {
                    push_text(&mut spec_parts, spec);
                }
                parts.push(FStringPart::Field {
                    expr: build_field(&source, line)?,
                    conversion,
                    spec: spec_parts,
                });
            }
        }
    }
    Ok(())
}

fn push_text(parts: &mut Vec<FStringPart>, text: String) {
    if text.is_empty() {
        return;
    }
    match parts.last_mut() {
        Some(FStringPart::Literal(last)) => last.push_str(&text),
        _ => parts.push(FStringPart::Literal(text)),
    }
}

/// Parse the expression inside an f-string replacement field
fn build_field(source: &str, line: usize) -> ParseResult<Expr> {
    let mut pairs = run_parser(Rule::fstring_expr, source).map_err(|err| match err.variant {
        ErrorVariant::CustomError { .. } => ParseError::syntax(TOO_COMPLEX, line),
        _ => ParseError::syntax("f-string: invalid syntax", line),
    })?;
    let root = expect(pairs.next(), line)?;
    check_nesting(&root, line)?;
    build_expression(first_child(root, line)?, line)
}

fn parse_decimal(text: &str, line: usize) -> ParseResult<Expr> {
    let digits = text.replace('_', "");
    if digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
        return Err(ParseError::syntax(
            "leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers",
            line,
        ));
    }
    parse_radix(&digits, 10, line)
}

fn parse_radix(digits: &str, radix: u32, line: usize) -> ParseResult<Expr> {
    let digits = digits.trim_start_matches('_').replace('_', "");
    i64::from_str_radix(&digits, radix)
        .map(|v| Expr::LitInt { v })
        .map_err(|_| ParseError::syntax("integer literal too large", line))
}
