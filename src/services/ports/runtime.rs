use futures::future::BoxFuture;

pub type Task = BoxFuture<'static, ()>;

pub trait AsyncExecutor: Send + Sync {
    fn spawn(&self, task: Task);
}
