//! Tests for branches, loops and try statements

use super::helpers::{logs, ret};

/* ===================== If ===================== */

#[test]
fn test_if_elif_else() {
    let source = "def grade(n):
    if n >= 90:
        return 'A'
    elif n >= 80:
        return 'B'
    else:
        return 'C'
return [grade(95), grade(85), grade(10)]";
    assert_eq!(ret(source), "['A', 'B', 'C']");
}

#[test]
fn test_single_line_suites() {
    assert_eq!(ret("x = 0\nif True: x = 1; x += 1\nreturn x"), "2");
}

/* ===================== Loops ===================== */

#[test]
fn test_while_with_break_and_continue() {
    let source = "i = 0
total = 0
while True:
    i += 1
    if i > 10:
        break
    if i % 2:
        continue
    total += i
return total";
    assert_eq!(ret(source), "30");
}

#[test]
fn test_for_else_runs_without_break() {
    let source = "found = None
for n in [3, 5, 7]:
    if n % 2 == 0:
        found = n
        break
else:
    found = 'none'
return found";
    assert_eq!(ret(source), "'none'");
}

#[test]
fn test_for_else_skipped_on_break() {
    let source = "for n in [3, 4, 7]:
    if n % 2 == 0:
        break
else:
    n = -1
return n";
    assert_eq!(ret(source), "4");
}

#[test]
fn test_while_else() {
    assert_eq!(ret("n = 3\nwhile n:\n    n -= 1\nelse:\n    n = 'done'\nreturn n"), "'done'");
}

#[test]
fn test_loop_target_unpacking() {
    let source = "out = []
for key, value in {'a': 1, 'b': 2}.items():
    out.append(key * value)
return out";
    assert_eq!(ret(source), "['a', 'bb']");
}

#[test]
fn test_return_from_nested_loops() {
    let source = "def find(grid, target):
    for r, row in enumerate(grid):
        for c, v in enumerate(row):
            if v == target:
                return (r, c)
    return None
return find([[1, 2], [3, 4]], 3)";
    assert_eq!(ret(source), "(1, 0)");
}

#[test]
fn test_iterating_list_while_appending_uses_snapshot() {
    assert_eq!(ret("a = [1, 2]\nfor x in a:\n    a.append(x)\nreturn a"), "[1, 2, 1, 2]");
}

/* ===================== Try ===================== */

#[test]
fn test_except_binds_exception() {
    let source = "try:
    {}['missing']
except KeyError as e:
    return 'caught ' + str(e)";
    assert_eq!(ret(source), "\"caught 'missing'\"");
}

#[test]
fn test_except_matches_base_class_and_tuple() {
    let source = "out = []
for thunk in [lambda: 1 / 0, lambda: [][1], lambda: int('x')]:
    try:
        thunk()
    except (IndexError, ValueError):
        out.append('lookup-or-value')
    except ArithmeticError:
        out.append('arith')
return out";
    assert_eq!(ret(source), "['arith', 'lookup-or-value', 'lookup-or-value']");
}

#[test]
fn test_else_and_finally_order() {
    let source = "try:
    print('body')
except Exception:
    print('handler')
else:
    print('else')
finally:
    print('finally')";
    assert_eq!(logs(source), vec!["body", "else", "finally"]);
}

#[test]
fn test_finally_runs_on_return() {
    let source = "def f():
    try:
        return 'body'
    finally:
        print('cleanup')
return f()";
    assert_eq!(ret(source), "'body'");
    assert_eq!(logs(source), vec!["cleanup"]);
}

#[test]
fn test_return_in_finally_overrides() {
    let source = "def f():
    try:
        raise ValueError('lost')
    finally:
        return 'finally wins'
return f()";
    assert_eq!(ret(source), "'finally wins'");
}

#[test]
fn test_bare_raise_reraises_active_exception() {
    let source = "try:
    try:
        raise ValueError('inner')
    except ValueError:
        print('logging')
        raise
except ValueError as e:
    return e.args";
    assert_eq!(ret(source), "('inner',)");
}

#[test]
fn test_handler_name_is_cleared() {
    let source = "try:
    raise ValueError('x')
except ValueError as err:
    pass
try:
    err
except NameError:
    return 'cleared'";
    assert_eq!(ret(source), "'cleared'");
}

#[test]
fn test_break_inside_try_in_loop() {
    let source = "count = 0
for i in range(5):
    try:
        if i == 2:
            break
    finally:
        count += 1
return count";
    assert_eq!(ret(source), "3");
}
