/// 拼接路由组前缀和端点路径
///
/// 两者缺省时视为空字符串，中间不插入任何分隔符。
pub fn compose_path(group_path: Option<&str>, member_path: Option<&str>) -> String {
    let group_path = group_path.unwrap_or_default();
    let member_path = member_path.unwrap_or_default();

    let mut path = String::with_capacity(group_path.len() + member_path.len());
    path.push_str(group_path);
    path.push_str(member_path);
    path
}
