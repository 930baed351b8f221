//! 博客文章：资源、属性集、命令描述与授权策略

use serde::{Deserialize, Serialize};
use usecase_application::crud::{
    Create, CrudDeps, Destroy, FRAMEWORK_FIELDS, ResourceCommand, Update,
};
use usecase_application::error::AppResult;
use usecase_application::policy::{Action, PolicyTarget};
use usecase_domain::actor::Actor;
use usecase_domain::attributes::{AttributeSet, Attributes};
use usecase_domain::persist::InMemoryStore;
use usecase_domain::resource::Resource;
use usecase_domain::validation::Validator;
use usecase_macros::attribute_set;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub lock_version: usize,
}

impl Resource for Post {
    const TYPE: &'static str = "post";
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn version(&self) -> usize {
        self.lock_version
    }
}

pub type Posts = InMemoryStore<Post>;

#[attribute_set]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub current_user: Option<Actor>,
}

#[attribute_set]
pub struct EditPost {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_version: Option<usize>,
    #[serde(default)]
    pub current_user: Option<Actor>,
}

/// 按 id 定位文章、不带其他字段（发布、删除）
#[attribute_set]
pub struct PostRef {
    pub id: u64,
    #[serde(default)]
    pub current_user: Option<Actor>,
}

pub struct CreatePostSpec;

impl ResourceCommand for CreatePostSpec {
    const NAME: &'static str = "posts.create";
    type Attrs = NewPost;
    type Adapter = Posts;

    fn rules(deps: &CrudDeps<Posts>) -> Validator<NewPost> {
        Validator::new()
            .presence("title")
            .length("title", None, Some(80))
            .uniqueness(deps.adapter.clone(), "title")
    }

    // 作者取自当前用户
    fn write_attributes(attrs: &NewPost) -> AppResult<Attributes> {
        let mut attributes = attrs.to_attributes()?.without(&FRAMEWORK_FIELDS);
        if let Some(actor) = attrs.current_user() {
            attributes.insert("author_id", actor.id());
        }
        Ok(attributes)
    }
}

pub struct UpdatePostSpec;

impl ResourceCommand for UpdatePostSpec {
    const NAME: &'static str = "posts.update";
    type Attrs = EditPost;
    type Adapter = Posts;

    fn rules(deps: &CrudDeps<Posts>) -> Validator<EditPost> {
        Validator::new()
            .length("title", None, Some(80))
            .uniqueness(deps.adapter.clone(), "title")
    }
}

pub struct PublishPostSpec;

impl ResourceCommand for PublishPostSpec {
    const NAME: &'static str = "posts.publish";
    type Attrs = PostRef;
    type Adapter = Posts;

    fn write_attributes(_attrs: &PostRef) -> AppResult<Attributes> {
        Ok(Attributes::new().with("published", true))
    }
}

pub struct DestroyPostSpec;

impl ResourceCommand for DestroyPostSpec {
    const NAME: &'static str = "posts.destroy";
    type Attrs = PostRef;
    type Adapter = Posts;
}

pub type CreatePost = Create<CreatePostSpec>;
pub type UpdatePost = Update<UpdatePostSpec>;
pub type PublishPost = Update<PublishPostSpec>;
pub type DestroyPost = Destroy<DestroyPostSpec>;

/// 编辑可创建；作者本人或管理员可修改、发布与删除
pub fn authorize(actor: Option<&Actor>, target: PolicyTarget<'_, Post>, action: &Action) -> bool {
    let Some(actor) = actor else {
        return false;
    };
    if actor.has_role("admin") {
        return true;
    }
    match (action, target.instance()) {
        (Action::Create, _) => actor.has_role("editor"),
        (_, Some(post)) => post.author_id.as_deref() == Some(actor.id()),
        _ => false,
    }
}
