//! A small ordered n-ary tree used for the table-of-contents hierarchy.

/// An ordered list of sibling nodes.
pub type List<T> = Vec<Node<T>>;

/// A value and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
  pub value:    T,
  pub children: List<T>,
}

/// Read-only view of a node handed to [`transform`] callbacks.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'n, T> {
  node: &'n Node<T>,
}

impl<'n, T> Cursor<'n, T> {
  #[must_use]
  pub const fn value(&self) -> &'n T {
    &self.node.value
  }

  #[must_use]
  pub fn child_count(&self) -> usize {
    self.node.children.len()
  }
}

impl<T> Node<T> {
  #[must_use]
  pub const fn new(value: T) -> Self {
    Self {
      value,
      children: Vec::new(),
    }
  }

  #[must_use]
  pub const fn with_children(value: T, children: List<T>) -> Self {
    Self { value, children }
  }

  /// Visits this node and its descendants in depth-first pre-order,
  /// stopping at the first error.
  pub fn walk<E>(
    &self,
    f: &mut impl FnMut(&T) -> Result<(), E>,
  ) -> Result<(), E> {
    f(&self.value)?;
    walk(&self.children, f)
  }

  /// Infallible pre-order traversal.
  pub fn visit(&self, f: &mut impl FnMut(&T)) {
    f(&self.value);
    visit(&self.children, f);
  }

  /// Infallible pre-order traversal with mutable access to each value.
  pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut T)) {
    f(&mut self.value);
    visit_mut(&mut self.children, f);
  }
}

impl<T> Node<Option<T>> {
  /// Turns a tree of optional values into a tree of values, or `None` if
  /// any node in it is empty.
  #[must_use]
  pub fn transpose(self) -> Option<Node<T>> {
    Some(Node {
      value:    self.value?,
      children: transpose(self.children)?,
    })
  }
}

/// Builds a tree with the same shape as `list`, mapping every value through
/// `f`. Parents are mapped before their children.
pub fn transform<T, U>(
  list: &[Node<T>],
  f: &mut impl FnMut(Cursor<'_, T>) -> U,
) -> List<U> {
  list
    .iter()
    .map(|node| {
      let value = f(Cursor { node });
      Node {
        value,
        children: transform(&node.children, f),
      }
    })
    .collect()
}

/// Pre-order walk over a list of trees, stopping at the first error.
pub fn walk<T, E>(
  list: &[Node<T>],
  f: &mut impl FnMut(&T) -> Result<(), E>,
) -> Result<(), E> {
  list.iter().try_for_each(|node| node.walk(f))
}

pub fn visit<T>(list: &[Node<T>], f: &mut impl FnMut(&T)) {
  for node in list {
    node.visit(f);
  }
}

pub fn visit_mut<T>(list: &mut [Node<T>], f: &mut impl FnMut(&mut T)) {
  for node in list {
    node.visit_mut(f);
  }
}

/// List form of [`Node::transpose`].
#[must_use]
pub fn transpose<T>(list: List<Option<T>>) -> Option<List<T>> {
  list.into_iter().map(Node::transpose).collect()
}
