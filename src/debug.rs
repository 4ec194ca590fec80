use alloc::{collections::VecDeque, string::String};
use core::{
    fmt::{self, Write},
    ptr::NonNull,
};

use crate::{AvlTree, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Writes the tree to `w` as a Graphviz digraph.
    ///
    /// Nodes are laid out one rank per level and labelled `key:balance`. Missing children are
    /// drawn as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node(NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { node.as_ref().key() };
                let balance = unsafe { self.links(node).balance() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                for child in unsafe { [self.links(node).left(), self.links(node).right()] } {
                    if let Some(child) = child {
                        let child_key = unsafe { child.as_ref().key() };

                        queue.push_back(Item::Node(child));
                        writeln!(
                            links,
                            "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                        )?;
                    } else {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            links,
                            "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                        )?;
                        missing += 1;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use std::string::String;

    use crate::AvlMap;

    #[test]
    fn empty_dotgraph() {
        let map: AvlMap<u32, ()> = AvlMap::new();
        let mut out = String::new();
        map.dotgraph("empty", &mut out).unwrap();

        assert_eq!(out, "digraph \"graph-empty\" {}");
    }

    #[test]
    fn dotgraph_labels_keys_with_balance() {
        let map: AvlMap<u32, ()> = [1, 2, 3, 4].into_iter().map(|k| (k, ())).collect();
        let mut out = String::new();
        map.dotgraph("t", &mut out).unwrap();

        // 2 is the root, right-heavy because of 4 under 3.
        assert!(out.contains("\"grapht-2\" [label=\"2:1\"]"), "{out}");
        assert!(out.contains("\"grapht-3\" [label=\"3:1\"]"), "{out}");
        assert!(out.contains("\"grapht-4\" [label=\"4:0\"]"), "{out}");
        assert!(out.contains("\"grapht-2\" -> \"grapht-1\";"), "{out}");
        assert!(out.contains("[shape=point]"), "{out}");
        assert!(out.ends_with(" }\n}"));
    }
}
