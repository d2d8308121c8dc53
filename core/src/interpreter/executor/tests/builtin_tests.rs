//! Tests for builtin functions and type constructors

use super::helpers::{logs, raises, ret};
use crate::interpreter::ExcKind;

/* ===================== Numeric ===================== */

#[test]
fn test_abs_divmod_round() {
    assert_eq!(ret("return abs(-3), abs(-2.5)"), "(3, 2.5)");
    assert_eq!(ret("return divmod(-7, 2)"), "(-4, 1)");
    assert_eq!(ret("return round(2.5), round(3.5), round(-0.5)"), "(2, 4, 0)");
    assert_eq!(ret("return round(2.675, 2)"), "2.67");
    assert_eq!(ret("return round(1234, -2)"), "1200");
}

#[test]
fn test_sum_min_max() {
    assert_eq!(ret("return sum([1, 2, 3]), sum([1, 2], 10)"), "(6, 13)");
    assert_eq!(ret("return sum([0.5, 0.25])"), "0.75");
    assert_eq!(ret("return min(3, 1, 2), max([3, 1, 2])"), "(1, 3)");
    assert_eq!(ret("return max(['aa', 'b', 'ccc'], key=len)"), "'ccc'");
    assert_eq!(ret("return min([], default='empty')"), "'empty'");
    assert_eq!(
        raises("return max([])"),
        (ExcKind::ValueError, "max() iterable argument is empty".to_string())
    );
}

#[test]
fn test_sum_rejects_strings() {
    assert_eq!(
        raises("return sum(['a', 'b'], '')").1,
        "sum() can't sum strings [use ''.join(seq) instead]"
    );
}

/* ===================== Sequences ===================== */

#[test]
fn test_sorted() {
    assert_eq!(ret("return sorted([3, 1, 2])"), "[1, 2, 3]");
    assert_eq!(ret("return sorted('bca')"), "['a', 'b', 'c']");
    assert_eq!(ret("return sorted([3, 1, 2], reverse=True)"), "[3, 2, 1]");
    assert_eq!(ret("return sorted({'b': 1, 'a': 2})"), "['a', 'b']");
}

#[test]
fn test_sorted_is_stable() {
    let source = "rows = [('x', 2), ('y', 1), ('z', 2), ('w', 1)]
return [r[0] for r in sorted(rows, key=lambda r: r[1])]";
    assert_eq!(ret(source), "['y', 'w', 'x', 'z']");
}

#[test]
fn test_sorted_mixed_types_raises() {
    assert_eq!(
        raises("return sorted([1, 'a'])").1,
        "'<' not supported between instances of 'str' and 'int'"
    );
}

#[test]
fn test_iteration_helpers_are_lazy_iterators() {
    assert_eq!(ret("return list(enumerate('ab'))"), "[(0, 'a'), (1, 'b')]");
    assert_eq!(ret("return list(enumerate('ab', start=1))"), "[(1, 'a'), (2, 'b')]");
    assert_eq!(ret("return list(zip([1, 2, 3], 'ab'))"), "[(1, 'a'), (2, 'b')]");
    assert_eq!(ret("return list(reversed([1, 2, 3])), tuple(reversed(range(3)))"), "([3, 2, 1], (2, 1, 0))");
    assert_eq!(ret("return list(map(lambda x: x * 10, [1, 2]))"), "[10, 20]");
    assert_eq!(ret("return list(map(lambda a, b: a + b, [1, 2], [10, 20, 30]))"), "[11, 22]");
    assert_eq!(ret("return list(filter(None, [0, 1, '', 'x']))"), "[1, 'x']");
    assert_eq!(ret("return list(filter(lambda n: n > 1, [1, 2, 3]))"), "[2, 3]");
    assert_eq!(ret("return dict(zip('ab', [1, 2]))"), "{'a': 1, 'b': 2}");
    assert_eq!(ret("return '-'.join(map(str, range(3)))"), "'0-1-2'");
    assert_eq!(ret("return type(map(abs, [])).__name__, repr(zip())"), "('map', '<zip object>')");
}

#[test]
fn test_iterators_are_consumed_once() {
    assert_eq!(ret("m = map(abs, [-1, -2])
return list(m), list(m)"), "([1, 2], [])");
    assert_eq!(ret("it = iter([1, 2, 3])
return next(it), list(it), next(it, 'done')"), "(1, [2, 3], 'done')");
    assert_eq!(ret("g = (x for x in range(5))
return 2 in g, next(g)"), "(True, 3)");
    assert_eq!(ret("it = iter('ab')
return iter(it) is it"), "True");
    let (kind, _) = raises("it = iter([])
next(it)");
    assert_eq!(kind, ExcKind::StopIteration);
    let (kind, message) = raises("next([1])");
    assert_eq!((kind, message.as_str()), (ExcKind::TypeError, "'list' object is not an iterator"));
}

#[test]
fn test_map_interleaves_with_loop_body() {
    let source = "def f(x):
    print('saw', x)
    return x
for y in map(f, [1, 2]):
    print('loop', y)
";
    assert_eq!(logs(source), vec!["saw 1", "loop 1", "saw 2", "loop 2"]);

    let source = "for y in (print('saw', x) or x for x in [1, 2]):
    print('loop', y)
";
    assert_eq!(logs(source), vec!["saw 1", "loop 1", "saw 2", "loop 2"]);
}

#[test]
fn test_any_stops_at_first_truthy_item() {
    assert_eq!(logs("any(print(x) or x for x in [0, 1, 2, 3])"), vec!["0", "1"]);
    assert_eq!(logs("all(print(x) or x for x in [1, 0, 2])"), vec!["1", "0"]);
    assert_eq!(ret("return any(x > 5 for x in range(1000000000000))"), "True");
    assert_eq!(ret("return next(x for x in range(10 ** 15) if x * x > 50)"), "8");
}

#[test]
fn test_generator_reentry_rejected() {
    let (kind, message) = raises("g = (next(g) for x in [1])
next(g)");
    assert_eq!((kind, message.as_str()), (ExcKind::ValueError, "generator already executing"));
}

#[test]
fn test_pow_and_radix_builtins() {
    assert_eq!(ret("return pow(2, 10), pow(2, -1), pow(3, 4, 5), pow(3, -1, 7)"), "(1024, 0.5, 1, 5)");
    assert_eq!(ret("return hex(255), hex(-31), oct(8), bin(5), bin(-5)"), "('0xff', '-0x1f', '0o10', '0b101', '-0b101')");
    let (kind, message) = raises("pow(2.0, 3, 5)");
    assert_eq!(
        (kind, message.as_str()),
        (ExcKind::TypeError, "pow() 3rd argument not allowed unless all arguments are integers")
    );
    let (kind, _) = raises("hex(1.5)");
    assert_eq!(kind, ExcKind::TypeError);
}

#[test]
fn test_any_all() {
    assert_eq!(ret("return any([]), all([]), any([0, 2]), all([1, 0])"), "(False, True, True, False)");
}

#[test]
fn test_len_of_containers() {
    assert_eq!(ret("return len('héllo'), len([1]), len({'a': 1}), len((1, 2))"), "(5, 1, 1, 2)");
}

/* ===================== Strings & Characters ===================== */

#[test]
fn test_chr_ord_repr_format() {
    assert_eq!(ret("return chr(65), ord('a')"), "('A', 97)");
    assert_eq!(ret("return repr('x'), repr(1.0)"), "(\"'x'\", '1.0')");
    assert_eq!(ret("return repr('\\xa0')"), "\"'\\\\xa0'\"");
    assert_eq!(ret("return format(3.14159, '.3f'), format(255, 'x')"), "('3.142', 'ff')");
    assert_eq!(ret("return format(1234567, ',')"), "'1,234,567'");
}

/* ===================== Constructors ===================== */

#[test]
fn test_int_conversion() {
    assert_eq!(ret("return int('42'), int(' -7 '), int(3.99), int(-3.99)"), "(42, -7, 3, -3)");
    assert_eq!(ret("return int('ff', 16), int('0b101', 0), int('1_000')"), "(255, 5, 1000)");
    assert_eq!(ret("return int(True), int()"), "(1, 0)");
    assert_eq!(
        raises("return int('4.5')"),
        (ExcKind::ValueError, "invalid literal for int() with base 10: '4.5'".to_string())
    );
}

#[test]
fn test_float_and_str_conversion() {
    assert_eq!(ret("return float('1.5'), float(2), float('inf')"), "(1.5, 2.0, inf)");
    assert_eq!(ret("return str(12), str(None), str([1, 'a'])"), "('12', 'None', \"[1, 'a']\")");
    assert_eq!(ret("return bool(''), bool([0]), bool(0.0)"), "(False, True, False)");
}

#[test]
fn test_container_constructors() {
    assert_eq!(ret("return list('ab'), tuple([1, 2])"), "(['a', 'b'], (1, 2))");
    assert_eq!(ret("return dict([('a', 1), ('b', 2)])"), "{'a': 1, 'b': 2}");
    assert_eq!(ret("return dict(x=1, y=2)"), "{'x': 1, 'y': 2}");
    assert_eq!(ret("a = [1, 2]\nb = list(a)\nb.append(3)\nreturn a"), "[1, 2]");
}

#[test]
fn test_isinstance_and_type() {
    assert_eq!(ret("return isinstance(1, int), isinstance(True, int), isinstance(1, (str, float))"), "(True, True, False)");
    assert_eq!(ret("return type(1.5).__name__, type([]) == list"), "('float', True)");
    assert_eq!(ret("return isinstance(ValueError('x'), Exception)"), "True");
}

#[test]
fn test_exception_constructors() {
    assert_eq!(ret("return ValueError('bad', 3).args"), "('bad', 3)");
    assert_eq!(ret("return repr(KeyError('k'))"), "\"KeyError('k')\"");
    assert_eq!(ret("return str(IndexError('out'))"), "'out'");
}
