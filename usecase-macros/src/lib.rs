use proc_macro::TokenStream;

mod attribute_set;
mod utils;

/// 属性集宏
/// - 仅支持具名字段结构体
/// - 合并/追加派生：Debug, Clone, Serialize, Deserialize
/// - 追加 `#[serde(deny_unknown_fields)]`，未知字段在构造时失败
/// - 自动实现 `::usecase_domain::attributes::AttributeSet`；若存在操作主体字段
///   （默认 `current_user`，类型为 `Actor` 或 `Option<Actor>`），生成 `current_user()`
/// - 参数：`#[attribute_set(actor = field_name)]` 指定操作主体字段名
#[proc_macro_attribute]
pub fn attribute_set(attr: TokenStream, item: TokenStream) -> TokenStream {
    attribute_set::expand(attr, item)
}
