//! Logic token streams that define volumes from face senses.
//!
//! A volume's membership predicate is a boolean expression over the senses
//! of its faces. Tokens are `u32`: small values are face indices (an operand
//! that is true when the point is *outside* that face), and the top of the
//! range is reserved for operators.
//!
//! Expressions are stored in postfix (RPN) order for evaluation on a stack:
//! `"0 ~ 1 &"` is "inside face 0 and outside face 1". An infix notation with
//! parentheses is accepted on input and converted with [`convert_logic`].

use crate::error::{IrError, Result};
use crate::types::LogicNotation;
use crate::OrangeInput;

/// A logic token.
pub type LogicInt = u32;

/// First value reserved for operators.
pub const LBEGIN: LogicInt = LogicInt::MAX - 6;
/// Open parenthesis (infix only).
pub const OPEN: LogicInt = LBEGIN;
/// Close parenthesis (infix only).
pub const CLOSE: LogicInt = LBEGIN + 1;
/// Binary "or".
pub const OR: LogicInt = LBEGIN + 2;
/// Binary "and".
pub const AND: LogicInt = LBEGIN + 3;
/// Unary negation.
pub const NOT: LogicInt = LBEGIN + 4;
/// Constant true; an operand despite living in the operator range.
pub const TRUE: LogicInt = LBEGIN + 5;

const OP_CHARS: [char; 6] = ['(', ')', '|', '&', '~', '*'];

/// Postfix expression that is never true.
pub const NOWHERE_LOGIC: [LogicInt; 2] = [TRUE, NOT];

/// Maximum stack depth the trackers can evaluate.
pub const MAX_LOGIC_DEPTH: usize = 64;

/// Whether a token is in the operator range (including [`TRUE`]).
#[inline]
pub fn is_operator_token(token: LogicInt) -> bool {
    token >= LBEGIN
}

/// Whether a token pushes a value: a face index or [`TRUE`].
#[inline]
pub fn is_operand_token(token: LogicInt) -> bool {
    !is_operator_token(token) || token == TRUE
}

/// Character representation of an operator token.
pub fn to_char(token: LogicInt) -> char {
    debug_assert!(is_operator_token(token));
    OP_CHARS[(token - LBEGIN) as usize]
}

/// Parse a whitespace-separated logic string such as `"0 ~ 1 &"`.
///
/// Digits form face indices; `*`, `|`, `&`, `~`, `(` and `)` map to their
/// operator tokens. Operators need no surrounding whitespace.
pub fn parse_logic(s: &str) -> Result<Vec<LogicInt>> {
    let mut result = Vec::new();
    let mut number: Option<LogicInt> = None;

    for (pos, ch) in s.char_indices() {
        if let Some(d) = ch.to_digit(10) {
            let n = number.unwrap_or(0);
            let n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add(d))
                .filter(|&n| n < LBEGIN)
                .ok_or(IrError::InvalidLogicChar { ch, pos })?;
            number = Some(n);
            continue;
        }
        if let Some(n) = number.take() {
            result.push(n);
        }
        if ch.is_whitespace() {
            continue;
        }
        match OP_CHARS.iter().position(|&c| c == ch) {
            Some(idx) => result.push(LBEGIN + idx as LogicInt),
            None => return Err(IrError::InvalidLogicChar { ch, pos }),
        }
    }
    if let Some(n) = number {
        result.push(n);
    }
    Ok(result)
}

/// Format tokens as a space-separated string, the inverse of [`parse_logic`].
pub fn logic_to_string(logic: &[LogicInt]) -> String {
    let mut s = String::new();
    for (i, &token) in logic.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        if is_operator_token(token) {
            s.push(to_char(token));
        } else {
            s.push_str(&token.to_string());
        }
    }
    s
}

/// Maximum stack depth needed to evaluate a postfix expression.
///
/// Fails unless the expression leaves exactly one value on the stack.
pub fn calc_depth(postfix: &[LogicInt]) -> Result<usize> {
    let mut depth = 1;
    let mut cur: usize = 0;
    for &token in postfix {
        if is_operand_token(token) {
            cur += 1;
        } else if token == AND || token == OR {
            depth = depth.max(cur);
            cur = cur.checked_sub(1).ok_or(IrError::UnbalancedLogic)?;
        } else if token == NOT {
            if cur == 0 {
                return Err(IrError::UnbalancedLogic);
            }
        } else {
            // Parentheses have no meaning in postfix
            return Err(IrError::UnbalancedLogic);
        }
    }
    if cur != 1 {
        return Err(IrError::UnbalancedLogic);
    }
    Ok(depth)
}

fn precedence(token: LogicInt) -> u8 {
    match token {
        OR => 1,
        AND => 2,
        _ => 3,
    }
}

/// Convert an infix expression to postfix with the shunting-yard algorithm.
///
/// Precedence is `~` over `&` over `|`; negation is right-associative.
pub fn convert_to_postfix(infix: &[LogicInt]) -> Result<Vec<LogicInt>> {
    let mut postfix = Vec::with_capacity(infix.len());
    let mut operators: Vec<LogicInt> = Vec::new();
    let mut expect_operand = true;

    for &token in infix {
        if is_operand_token(token) {
            if !expect_operand {
                return Err(IrError::UnbalancedLogic);
            }
            postfix.push(token);
            expect_operand = false;
            continue;
        }

        match token {
            OPEN => {
                if !expect_operand {
                    return Err(IrError::UnbalancedLogic);
                }
                operators.push(OPEN);
            }
            CLOSE => {
                if expect_operand {
                    return Err(IrError::UnbalancedLogic);
                }
                loop {
                    match operators.pop() {
                        Some(OPEN) => break,
                        Some(op) => postfix.push(op),
                        None => return Err(IrError::MismatchedParens),
                    }
                }
            }
            NOT | AND | OR => {
                if (token == NOT) != expect_operand {
                    return Err(IrError::UnbalancedLogic);
                }
                let prec = precedence(token);
                while let Some(&top) = operators.last() {
                    if top == OPEN {
                        break;
                    }
                    let top_prec = precedence(top);
                    if top_prec > prec || (top_prec == prec && token != NOT) {
                        postfix.push(top);
                        operators.pop();
                    } else {
                        break;
                    }
                }
                operators.push(token);
                expect_operand = true;
            }
            _ => return Err(IrError::UnbalancedLogic),
        }
    }

    if expect_operand {
        return Err(IrError::UnbalancedLogic);
    }
    while let Some(op) = operators.pop() {
        if op == OPEN {
            return Err(IrError::MismatchedParens);
        }
        postfix.push(op);
    }
    Ok(postfix)
}

/// Convert a postfix expression to infix with minimal parentheses.
///
/// A subexpression is wrapped only when it joins with the opposite binary
/// operator, or when a join is negated.
pub fn convert_to_infix(postfix: &[LogicInt]) -> Result<Vec<LogicInt>> {
    // Each entry: the top-level operator of the subexpression (TRUE for a
    // bare operand) and its tokens
    let mut stack: Vec<(LogicInt, Vec<LogicInt>)> = Vec::new();

    let wrap = |acc: &mut Vec<LogicInt>, expr: Vec<LogicInt>, parens: bool| {
        if parens {
            acc.push(OPEN);
        }
        acc.extend(expr);
        if parens {
            acc.push(CLOSE);
        }
    };

    for &token in postfix {
        match token {
            t if is_operand_token(t) => stack.push((TRUE, vec![t])),
            AND | OR => {
                let (type_2, expr_2) = stack.pop().ok_or(IrError::UnbalancedLogic)?;
                let (type_1, expr_1) = stack.pop().ok_or(IrError::UnbalancedLogic)?;
                let opposite = if token == OR { AND } else { OR };
                let mut expr = Vec::with_capacity(expr_1.len() + expr_2.len() + 5);
                wrap(&mut expr, expr_1, type_1 == opposite);
                expr.push(token);
                wrap(&mut expr, expr_2, type_2 == opposite);
                stack.push((token, expr));
            }
            NOT => {
                let (ty, inner) = stack.pop().ok_or(IrError::UnbalancedLogic)?;
                let mut expr = Vec::with_capacity(inner.len() + 3);
                expr.push(NOT);
                wrap(&mut expr, inner, ty == AND || ty == OR);
                stack.push((NOT, expr));
            }
            _ => return Err(IrError::UnbalancedLogic),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some((_, expr)), true) => Ok(expr),
        _ => Err(IrError::UnbalancedLogic),
    }
}

/// Rewrite every volume's logic in `input` to the requested notation.
pub fn convert_logic(input: &mut OrangeInput, to: LogicNotation) -> Result<()> {
    if input.logic == to {
        return Ok(());
    }
    let convert = match to {
        LogicNotation::Postfix => convert_to_postfix,
        LogicNotation::Infix => convert_to_infix,
    };
    for unit in input.units_mut() {
        for vol in unit.volumes.iter_mut() {
            vol.logic = convert(&vol.logic)?;
        }
    }
    input.logic = to;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Vec<LogicInt> {
        parse_logic(s).unwrap()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(to_char(OPEN), '(');
        assert_eq!(to_char(TRUE), '*');
        assert!(is_operator_token(TRUE));
        assert!(is_operand_token(TRUE));
        assert!(is_operand_token(12));
        assert!(!is_operand_token(NOT));
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("0 ~ 1 &"), vec![0, NOT, 1, AND]);
        assert_eq!(parse("12 3|*"), vec![12, 3, OR, TRUE]);
        assert_eq!(parse("(0&~1)"), vec![OPEN, 0, AND, NOT, 1, CLOSE]);
        assert_eq!(parse(""), Vec::<LogicInt>::new());

        let err = parse_logic("0 1 x").unwrap_err();
        assert!(matches!(err, IrError::InvalidLogicChar { ch: 'x', pos: 4 }));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(logic_to_string(&[0, NOT, 1, AND]), "0 ~ 1 &");
        assert_eq!(logic_to_string(&NOWHERE_LOGIC), "* ~");
        assert_eq!(parse(&logic_to_string(&parse("3 4 | ~ 5 &"))), parse("3 4 | ~ 5 &"));
    }

    #[test]
    fn test_calc_depth() {
        assert_eq!(calc_depth(&[TRUE]).unwrap(), 1);
        assert_eq!(calc_depth(&NOWHERE_LOGIC).unwrap(), 1);
        assert_eq!(calc_depth(&parse("0 ~ 1 &")).unwrap(), 2);
        assert_eq!(calc_depth(&parse("0 1 2 3 & & &")).unwrap(), 4);
        assert_eq!(calc_depth(&parse("0 1 & 2 & 3 &")).unwrap(), 2);

        assert!(calc_depth(&parse("0 1")).is_err());
        assert!(calc_depth(&parse("0 &")).is_err());
        assert!(calc_depth(&parse("~")).is_err());
        assert!(calc_depth(&[]).is_err());
    }

    #[test]
    fn test_to_postfix() {
        assert_eq!(convert_to_postfix(&parse("0 & ~ 1")).unwrap(), parse("0 1 ~ &"));
        assert_eq!(convert_to_postfix(&parse("0 | 1 & 2")).unwrap(), parse("0 1 2 & |"));
        assert_eq!(
            convert_to_postfix(&parse("(0 | 1) & 2")).unwrap(),
            parse("0 1 | 2 &")
        );
        assert_eq!(convert_to_postfix(&parse("~ ~ 0")).unwrap(), parse("0 ~ ~"));
        assert_eq!(convert_to_postfix(&parse("0 & 1 & 2")).unwrap(), parse("0 1 & 2 &"));
        assert_eq!(convert_to_postfix(&parse("~ *")).unwrap(), NOWHERE_LOGIC.to_vec());

        assert!(matches!(
            convert_to_postfix(&parse("(0 & 1")),
            Err(IrError::MismatchedParens)
        ));
        assert!(convert_to_postfix(&parse("0 1 &")).is_err());
        assert!(convert_to_postfix(&parse("0 &")).is_err());
    }

    #[test]
    fn test_to_infix() {
        assert_eq!(convert_to_infix(&parse("0 1 ~ &")).unwrap(), parse("0 & ~ 1"));
        assert_eq!(convert_to_infix(&parse("0 1 2 & |")).unwrap(), parse("0 | (1 & 2)"));
        assert_eq!(
            convert_to_infix(&parse("0 1 | 2 &")).unwrap(),
            parse("(0 | 1) & 2")
        );
        assert_eq!(convert_to_infix(&parse("0 1 & ~")).unwrap(), parse("~ (0 & 1)"));
        assert_eq!(convert_to_infix(&parse("0 ~ ~")).unwrap(), parse("~ ~ 0"));
        assert!(convert_to_infix(&parse("0 1")).is_err());
    }

    #[test]
    fn test_round_trip_infix() {
        for s in ["0 1 | 2 & 3 ~ |", "0 ~ 1 ~ & 2 ~ &", "* ~", "4 5 6 | & ~"] {
            let postfix = parse(s);
            let infix = convert_to_infix(&postfix).unwrap();
            assert_eq!(convert_to_postfix(&infix).unwrap(), postfix, "{s}");
        }
    }
}
