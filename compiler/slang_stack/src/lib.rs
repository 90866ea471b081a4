//! Stack growth for deep recursion.
//!
//! Every pass of the front end walks statement and expression trees
//! recursively. Generated code (long `else if` chains produced by switch
//! lowering, nested binary operators from the parser) can nest deeply enough
//! to exhaust the main thread's stack, so recursive entry points run inside
//! [`ensure_sufficient_stack`].
//!
//! On native targets the stack is grown on demand with `stacker`; on
//! `wasm32` the closure is called directly.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Run `f` directly; the wasm runtime manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Chain {
        Leaf,
        Link(Box<Chain>),
    }

    fn build(depth: u32) -> Chain {
        let mut chain = Chain::Leaf;
        for _ in 0..depth {
            chain = Chain::Link(Box::new(chain));
        }
        chain
    }

    fn depth_of(chain: &Chain) -> u32 {
        ensure_sufficient_stack(|| match chain {
            Chain::Leaf => 0,
            Chain::Link(inner) => depth_of(inner) + 1,
        })
    }

    #[test]
    fn walks_shallow_tree() {
        assert_eq!(depth_of(&build(3)), 3);
    }

    #[test]
    fn walks_deeply_nested_tree() {
        let chain = build(200_000);
        assert_eq!(depth_of(&chain), 200_000);
        // Iterative drop; the recursive default drop would overflow here.
        let mut current = chain;
        while let Chain::Link(inner) = current {
            current = *inner;
        }
    }

    #[test]
    fn passes_result_through() {
        let value: Result<u8, String> = ensure_sufficient_stack(|| Ok(7));
        assert_eq!(value, Ok(7));
    }
}
