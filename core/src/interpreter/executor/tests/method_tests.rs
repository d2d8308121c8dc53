//! Tests for str, list, dict and tuple methods

use super::helpers::{raises, ret};
use crate::interpreter::ExcKind;

/* ===================== str ===================== */

#[test]
fn test_str_case_and_whitespace() {
    assert_eq!(ret("return '  Hi  '.strip(), 'abc'.upper(), 'ABC'.lower()"), "('Hi', 'ABC', 'abc')");
    assert_eq!(ret("return 'hello world'.title(), 'hELLO'.capitalize()"), "('Hello World', 'Hello')");
    assert_eq!(ret("return 'xxhixx'.strip('x'), '..a'.lstrip('.'), 'a!!'.rstrip('!')"), "('hi', 'a', 'a')");
}

#[test]
fn test_str_split_and_join() {
    assert_eq!(ret("return 'a b  c'.split()"), "['a', 'b', 'c']");
    assert_eq!(ret("return 'a,b,,c'.split(',')"), "['a', 'b', '', 'c']");
    assert_eq!(ret("return 'a-b-c'.split('-', 1), 'a-b-c'.rsplit('-', 1)"), "(['a', 'b-c'], ['a-b', 'c'])");
    assert_eq!(ret("return ', '.join(['x', 'y', 'z'])"), "'x, y, z'");
    assert_eq!(ret("return 'one\\ntwo\\r\\nthree'.splitlines()"), "['one', 'two', 'three']");
    assert_eq!(
        raises("return ''.join([1])"),
        (ExcKind::TypeError, "sequence item 0: expected str instance, int found".to_string())
    );
}

#[test]
fn test_str_search() {
    assert_eq!(ret("return 'banana'.find('an'), 'banana'.rfind('an'), 'banana'.find('x')"), "(1, 3, -1)");
    assert_eq!(ret("return 'banana'.count('a'), 'banana'.index('n')"), "(3, 2)");
    assert_eq!(ret("return 'file.py'.endswith(('.py', '.txt')), 'abc'.startswith('b')"), "(True, False)");
    assert_eq!(
        raises("return 'abc'.index('z')"),
        (ExcKind::ValueError, "substring not found".to_string())
    );
}

#[test]
fn test_str_replace_partition_predicates() {
    assert_eq!(ret("return 'aaa'.replace('a', 'b', 2)"), "'bba'");
    assert_eq!(ret("return 'key=value=x'.partition('=')"), "('key', '=', 'value=x')");
    assert_eq!(ret("return '123'.isdigit(), 'ab1'.isalpha(), ''.isdigit()"), "(True, False, False)");
}

#[test]
fn test_str_padding() {
    assert_eq!(ret("return '42'.zfill(5), '-42'.zfill(5)"), "('00042', '-0042')");
    assert_eq!(ret("return 'ab'.center(6, '*'), 'ab'.ljust(4) + '|', 'ab'.rjust(4, '.')"), "('**ab**', 'ab  |', '..ab')");
}

#[test]
fn test_str_format_method() {
    assert_eq!(ret("return '{} + {} = {}'.format(1, 2, 3)"), "'1 + 2 = 3'");
    assert_eq!(ret("return '{name}: {0:.1f}'.format(2.26, name='total')"), "'total: 2.3'");
    assert_eq!(ret("return '{0[0]}/{0[1]}'.format(['a', 'b'])"), "'a/b'");
    assert_eq!(ret("return '{p[x]} {e.args}'.format(p={'x': 1}, e=ValueError('v'))"), "\"1 ('v',)\"");
    assert_eq!(ret("return '{:>{}}|'.format('ab', 4)"), "'  ab|'");
}

/* ===================== list ===================== */

#[test]
fn test_list_mutators() {
    let source = "a = [3, 1]
a.append(2)
a.extend((5, 4))
a.insert(0, 9)
a.remove(5)
return a";
    assert_eq!(ret(source), "[9, 3, 1, 2, 4]");
}

#[test]
fn test_list_pop() {
    assert_eq!(ret("a = [1, 2, 3]\nlast = a.pop()\nfirst = a.pop(0)\nreturn a, first, last"), "([2], 1, 3)");
    assert_eq!(
        raises("return [].pop()"),
        (ExcKind::IndexError, "pop from empty list".to_string())
    );
}

#[test]
fn test_list_sort_in_place() {
    assert_eq!(ret("a = [3, 1, 2]\nresult = a.sort()\nreturn a, result"), "([1, 2, 3], None)");
    assert_eq!(ret("a = ['bb', 'a', 'ccc']\na.sort(key=len, reverse=True)\nreturn a"), "['ccc', 'bb', 'a']");
}

#[test]
fn test_list_queries() {
    assert_eq!(ret("a = [1, 2, 1]\nreturn a.index(2), a.count(1)"), "(1, 2)");
    assert_eq!(
        raises("return [1].index(5)"),
        (ExcKind::ValueError, "5 is not in list".to_string())
    );
    assert_eq!(
        raises("[1].remove(5)"),
        (ExcKind::ValueError, "list.remove(x): x not in list".to_string())
    );
}

#[test]
fn test_list_copy_reverse_clear() {
    let source = "a = [1, 2, 3]
b = a.copy()
a.reverse()
c = list(a)
a.clear()
return a, b, c";
    assert_eq!(ret(source), "([], [1, 2, 3], [3, 2, 1])");
}

/* ===================== dict ===================== */

#[test]
fn test_dict_access() {
    assert_eq!(ret("d = {'a': 1}\nreturn d.get('a'), d.get('b'), d.get('b', 0)"), "(1, None, 0)");
    assert_eq!(ret("d = {'a': 1, 'b': 2}\nreturn d.keys(), d.values(), d.items()"), "(['a', 'b'], [1, 2], [('a', 1), ('b', 2)])");
}

#[test]
fn test_dict_mutators() {
    let source = "d = {'a': 1}
d.setdefault('b', []).append(2)
d.setdefault('a', 99)
d.update({'c': 3}, d=4)
removed = d.pop('c')
missing = d.pop('zz', 'default')
return d, removed, missing";
    assert_eq!(ret(source), "({'a': 1, 'b': [2], 'd': 4}, 3, 'default')");
}

#[test]
fn test_dict_popitem_is_lifo() {
    assert_eq!(ret("d = {'a': 1, 'b': 2}\nreturn d.popitem(), d"), "(('b', 2), {'a': 1})");
    assert_eq!(
        raises("return {}.popitem()"),
        (ExcKind::KeyError, "'popitem(): dictionary is empty'".to_string())
    );
}

#[test]
fn test_dict_pop_missing_key() {
    assert_eq!(raises("return {}.pop('k')"), (ExcKind::KeyError, "'k'".to_string()));
}

#[test]
fn test_dict_copy_is_shallow() {
    assert_eq!(ret("d = {'k': [1]}\ne = d.copy()\ne['k'].append(2)\ne['n'] = 0\nreturn d"), "{'k': [1, 2]}");
}

/* ===================== tuple ===================== */

#[test]
fn test_tuple_methods() {
    assert_eq!(ret("t = (1, 2, 2)\nreturn t.count(2), t.index(2)"), "(2, 1)");
}

/* ===================== Bound Methods ===================== */

#[test]
fn test_bound_method_as_value() {
    assert_eq!(ret("out = []\nadd = out.append\nadd(1)\nadd(2)\nreturn out"), "[1, 2]");
    assert_eq!(ret("up = 'a'.upper\nreturn up()"), "'A'");
}
