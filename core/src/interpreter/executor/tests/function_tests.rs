//! Tests for function definitions and calls

use super::helpers::{raises, ret};
use crate::interpreter::ExcKind;

/* ===================== Arguments ===================== */

#[test]
fn test_defaults_and_keywords() {
    let source = "def greet(name, greeting='Hello', punct='!'):
    return greeting + ', ' + name + punct
return [greet('a'), greet('b', 'Hi'), greet('c', punct='?'), greet(greeting='Yo', name='d')]";
    assert_eq!(ret(source), "['Hello, a!', 'Hi, b!', 'Hello, c?', 'Yo, d!']");
}

#[test]
fn test_star_arguments_spread() {
    assert_eq!(ret("def add(a, b, c):\n    return a + b + c\nreturn add(1, *[2, 3])"), "6");
    assert_eq!(ret("return max(*(4, 9, 2))"), "9");
}

#[test]
fn test_defaults_evaluated_once() {
    let source = "def push(x, acc=[]):
    acc.append(x)
    return acc
push(1)
return push(2)";
    assert_eq!(ret(source), "[1, 2]");
}

#[test]
fn test_argument_count_errors() {
    let (kind, message) = raises("def f(a, b):\n    return a\nreturn f(1)");
    assert_eq!(kind, ExcKind::TypeError);
    assert_eq!(message, "f() missing 1 required positional argument: 'b'");

    let (_, message) = raises("def f(a, b, c):\n    return a\nreturn f()");
    assert_eq!(message, "f() missing 3 required positional arguments: 'a', 'b', and 'c'");

    let (_, message) = raises("def f(a):\n    return a\nreturn f(1, 2)");
    assert_eq!(message, "f() takes 1 positional argument but 2 were given");

    let (_, message) = raises("def f(a, b=1):\n    return a\nreturn f(1, 2, 3)");
    assert_eq!(message, "f() takes from 1 to 2 positional arguments but 3 were given");
}

#[test]
fn test_keyword_errors() {
    let (_, message) = raises("def f(a):\n    return a\nreturn f(b=1)");
    assert_eq!(message, "f() got an unexpected keyword argument 'b'");

    let (_, message) = raises("def f(a):\n    return a\nreturn f(1, a=2)");
    assert_eq!(message, "f() got multiple values for argument 'a'");
}

#[test]
fn test_function_without_return_gives_none() {
    assert_eq!(ret("def f():\n    x = 1\nreturn f()"), "None");
}

/* ===================== Closures ===================== */

#[test]
fn test_closure_captures_enclosing_locals() {
    let source = "def make_adder(n):
    def add(x):
        return x + n
    return add
add5 = make_adder(5)
return add5(10), make_adder(1)(1)";
    assert_eq!(ret(source), "(15, 2)");
}

#[test]
fn test_closure_sees_later_rebinding() {
    let source = "def outer():
    x = 1
    def get():
        return x
    x = 2
    return get()
return outer()";
    assert_eq!(ret(source), "2");
}

#[test]
fn test_script_locals_visible_to_nested_functions() {
    let source = "rate = 3
def scale(v):
    return v * rate
return [scale(v) for v in [1, 2]]";
    assert_eq!(ret(source), "[3, 6]");
}

#[test]
fn test_lambdas() {
    assert_eq!(ret("sq = lambda x: x * x\nreturn sq(7)"), "49");
    assert_eq!(ret("return (lambda a, b=10: a + b)(5)"), "15");
    assert_eq!(
        ret("pairs = [(1, 'b'), (0, 'c'), (2, 'a')]\nreturn sorted(pairs, key=lambda p: p[1])"),
        "[(2, 'a'), (1, 'b'), (0, 'c')]"
    );
}

/* ===================== Recursion ===================== */

#[test]
fn test_recursive_function() {
    let source = "def fact(n):
    return 1 if n <= 1 else n * fact(n - 1)
return fact(20)";
    assert_eq!(ret(source), "2432902008176640000");
}

#[test]
fn test_mutual_recursion() {
    let source = "def is_even(n):
    return True if n == 0 else is_odd(n - 1)
def is_odd(n):
    return False if n == 0 else is_even(n - 1)
return is_even(10), is_odd(7)";
    assert_eq!(ret(source), "(True, True)");
}

#[test]
fn test_unbounded_recursion_raises() {
    let (kind, message) = raises("def f(n):\n    return f(n + 1)\nreturn f(0)");
    assert_eq!(kind, ExcKind::RecursionError);
    assert_eq!(message, "maximum recursion depth exceeded");
}

#[test]
fn test_recursion_error_is_catchable() {
    let source = "def f():
    return f()
try:
    f()
except RuntimeError:
    return 'recovered'";
    assert_eq!(ret(source), "'recovered'");
}

/* ===================== Function Values ===================== */

#[test]
fn test_functions_are_values() {
    assert_eq!(ret("def f():\n    pass\nreturn f.__name__"), "'f'");
    assert_eq!(ret("def f():\n    pass\nreturn repr(f)"), "'<function f>'");
    assert_eq!(ret("return len.__name__"), "'len'");
}

#[test]
fn test_calling_non_callable() {
    let (kind, message) = raises("x = 5\nreturn x()");
    assert_eq!(kind, ExcKind::TypeError);
    assert_eq!(message, "'int' object is not callable");
}
