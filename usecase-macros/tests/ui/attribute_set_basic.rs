use usecase_domain::actor::Actor;
use usecase_domain::attributes::{AttributeSet, Attributes};
use usecase_macros::attribute_set;

#[attribute_set]
struct CreatePost {
    title: String,
    body: Option<String>,
    current_user: Option<Actor>,
}

#[attribute_set]
#[derive(PartialEq)]
struct Ping {
    message: String,
}

fn main() {
    let actor = Actor::builder().id("u-1").build();
    let cmd = CreatePost {
        title: "T".into(),
        body: None,
        current_user: Some(actor.clone()),
    };

    // Debug/Clone 由宏追加
    let _ = format!("{:?}", cmd.clone());
    assert_eq!(cmd.current_user(), Some(&actor));

    // 没有 current_user 字段时沿用默认实现
    let ping = Ping { message: "hi".into() };
    assert!(ping.current_user().is_none());
    let attrs = ping.to_attributes().unwrap();
    assert_eq!(Ping::from_attributes(&attrs).unwrap(), ping);

    // 未知字段在构造时失败
    let bad = Attributes::new().with("message", "hi").with("extra", 1);
    assert!(Ping::from_attributes(&bad).is_err());
}
