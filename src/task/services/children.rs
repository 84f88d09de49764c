//! Lazy listing of a parent's children.

use crate::task::{
    domain::{Task, TaskId},
    ports::{ChildCursor, TaskRepository, TaskRepositoryResult},
};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Children of one fetched page, ready to be flattened into the listing.
type ChildBatch = stream::Iter<std::vec::IntoIter<TaskRepositoryResult<Task>>>;

/// Number of children fetched per repository page.
const DEFAULT_PAGE_SIZE: usize = 32;

/// Restartable sequence of a parent's children in creation order.
///
/// Each call to [`ChildTasks::stream`] starts a fresh pass from the first
/// child and fetches pages only as the stream is polled.
pub struct ChildTasks<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
    parent: TaskId,
    page_size: usize,
}

impl<R> ChildTasks<R>
where
    R: TaskRepository + 'static,
{
    /// Creates a listing over `parent`'s children.
    #[must_use]
    pub const fn new(repository: Arc<R>, parent: TaskId) -> Self {
        Self {
            repository,
            parent,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size; zero is treated as one.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 { 1 } else { page_size };
        self
    }

    /// Returns the parent whose children are listed.
    #[must_use]
    pub const fn parent(&self) -> &TaskId {
        &self.parent
    }

    /// Starts a new pass over the children.
    #[must_use]
    pub fn stream(&self) -> BoxStream<'static, TaskRepositoryResult<Task>> {
        let repository = Arc::clone(&self.repository);
        let parent = self.parent.clone();
        let page_size = self.page_size;

        stream::try_unfold(Some(ChildCursor::start()), move |cursor| {
            fetch_page(Arc::clone(&repository), parent.clone(), cursor, page_size)
        })
        .try_flatten()
        .boxed()
    }

    /// Collects every child into memory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::task::ports::TaskRepositoryError`] when a page cannot
    /// be read.
    pub async fn collect(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.stream().try_collect().await
    }
}

async fn fetch_page<R>(
    repository: Arc<R>,
    parent: TaskId,
    cursor: Option<ChildCursor>,
    page_size: usize,
) -> TaskRepositoryResult<Option<(ChildBatch, Option<ChildCursor>)>>
where
    R: TaskRepository,
{
    let Some(position) = cursor else {
        return Ok(None);
    };
    let page = repository
        .children_page(&parent, position, page_size)
        .await?;
    let batch: Vec<TaskRepositoryResult<Task>> = page.tasks.into_iter().map(Ok).collect();
    Ok(Some((stream::iter(batch), page.next)))
}
