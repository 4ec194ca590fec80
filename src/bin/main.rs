use std::ptr::NonNull;

use cordyceps::Linked;
use cordyceps_avl::{equal_paths, AvlMap, AvlTree, BinaryNode, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
struct Job {
    links: Links<Job>,
    priority: u32,
    name: &'static str,
}

impl Job {
    fn new(priority: u32, name: &'static str) -> Box<Job> {
        Box::new(Job {
            links: Links::new(),
            priority,
            name,
        })
    }
}

unsafe impl Linked<Links<Job>> for Job {
    type Handle = Box<Job>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Job>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<Job>> for Job {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.priority
    }
}

fn main() {
    let mut jobs: AvlTree<Job> = AvlTree::new();

    let queue = [
        (20, "compact"),
        (5, "flush"),
        (40, "gc"),
        (10, "sync"),
        (30, "scrub"),
    ];

    for (priority, name) in queue {
        jobs.insert(Job::new(priority, name));
        jobs.assert_invariants();
        println!("{jobs:?} height={}", jobs.height());
    }

    if let Some(old) = jobs.insert(Job::new(10, "fsync")) {
        println!("replaced {:?} with {:?}", old.name, jobs.get(&10).map(|job| job.name));
    }

    while let Some(job) = jobs.pop_first() {
        jobs.assert_invariants();
        println!("running {} (priority {})", job.name, job.priority);
    }

    let map: AvlMap<u32, u32> = (1..=15).map(|k| (k, k * k)).collect();
    map.assert_invariants();

    let mut graph = String::new();
    if map.dotgraph("squares", &mut graph).is_ok() {
        println!("{graph}");
    }

    let tree = BinaryNode::new(
        1,
        Some(BinaryNode::new(2, Some(BinaryNode::leaf(4)), None)),
        Some(BinaryNode::leaf(3)),
    );
    println!("equal paths: {}", equal_paths(Some(&tree)));
}
