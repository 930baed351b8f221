mod posts;

use anyhow::Context;
use posts::{
    CreatePost, DestroyPost, EditPost, NewPost, Post, PostRef, Posts, PublishPost, UpdatePost,
    authorize,
};
use std::sync::Arc;
use std::time::Duration;
use usecase_application::context::{AppContext, BusinessContext};
use usecase_application::crud::CrudDeps;
use usecase_application::deferred::{CommandRegistry, InMemoryJobQueue, JobWorker, WorkerConfig};
use usecase_application::observability;
use usecase_application::policy::policy_fn;
use usecase_application::{Command, CommandExt};
use usecase_domain::actor::Actor;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let store = Arc::new(Posts::new());
    let queue = Arc::new(InMemoryJobQueue::new());
    let deps = CrudDeps::new(store.clone(), Arc::new(policy_fn::<Post, _>(authorize)));
    let ctx = AppContext::builder()
        .biz(BusinessContext::builder().correlation_id("demo").build())
        .unit_of_work(store.clone())
        .job_queue(queue.clone())
        .build();

    let alice = Actor::builder().id("alice").roles(vec!["editor".into()]).build();
    let guest = Actor::builder().id("guest").build();

    // 1) 编辑创建文章
    let post = CreatePost::new(
        NewPost {
            title: "Hello".into(),
            body: "first post".into(),
            current_user: Some(alice.clone()),
        },
        deps.clone(),
    )
    .on_ok(|post| println!("created: #{} {:?}", post.id, post.title))
    .on_invalid(|errors| println!("invalid: {:?}", errors.full_messages()))
    .call(&ctx)
    .await?
    .ok()
    .context("post was not created")?;

    // 2) 重复标题：校验失败
    CreatePost::new(
        NewPost {
            title: "Hello".into(),
            body: String::new(),
            current_user: Some(alice.clone()),
        },
        deps.clone(),
    )
    .subscribe()
    .on_invalid(|errors| println!("duplicate title: {:?}", errors.full_messages()))
    .call(&ctx)
    .await?;

    // 3) 访客无权修改
    let outcome = UpdatePost::new(
        EditPost {
            id: post.id,
            title: Some("Hijacked".into()),
            body: None,
            lock_version: None,
            current_user: Some(guest),
        },
        deps.clone(),
    )
    .call(&ctx)
    .await?;
    println!("guest update: {}", outcome.kind());

    // 4) 过期版本被拒绝
    UpdatePost::new(
        EditPost {
            id: post.id,
            title: Some("Hello, again".into()),
            body: None,
            lock_version: Some(post.lock_version + 1),
            current_user: Some(alice.clone()),
        },
        deps.clone(),
    )
    .subscribe()
    .on_stale(|| println!("stale update rejected"))
    .call(&ctx)
    .await?;

    // 5) 延迟发布：先入队，再由工作者执行
    let registry = Arc::new(CommandRegistry::new());
    let publish_deps = deps.clone();
    registry.register(move |attrs| PublishPost::from_attributes(attrs, publish_deps.clone()))?;

    let job = PublishPost::new(
        PostRef {
            id: post.id,
            current_user: Some(alice.clone()),
        },
        deps.clone(),
    )
    .call_later(&ctx)
    .await?;
    println!(
        "{} enqueued: {:?}, queued jobs = {}",
        PublishPost::NAME,
        job.ok(),
        queue.len()?
    );

    let worker = JobWorker::builder()
        .queue(queue.clone())
        .registry(registry)
        .context(ctx.clone())
        .config(WorkerConfig {
            poll_interval: Duration::from_millis(10),
            max_jobs_per_tick: 8,
        })
        .build();
    let handle = Arc::new(worker).start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown();
    handle.join().await;

    let published = store.get(&post.id)?.context("post disappeared")?;
    tracing::info!(post_id = published.id, published = published.published, "worker drained");
    println!(
        "after worker: published = {}, lock_version = {}",
        published.published, published.lock_version
    );

    // 6) 删除
    let removed = DestroyPost::new(
        PostRef {
            id: post.id,
            current_user: Some(alice),
        },
        deps,
    )
    .call(&ctx)
    .await?;
    println!(
        "destroy: {}, remaining posts = {}",
        removed.kind(),
        store.len()?
    );

    Ok(())
}
