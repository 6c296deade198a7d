// * Domestic region list used to isolate posts from outside the mainland list

/// Provinces, municipalities and autonomous regions whose posts are excluded
pub const DOMESTIC_REGIONS: [&str; 32] = [
    "北京", "天津", "上海", "重庆", "河北", "山西", "辽宁", "吉林", "黑龙江", "江苏", "浙江", "安徽",
    "福建", "江西", "山东", "河南", "湖北", "湖南", "广东", "海南", "四川", "贵州", "云南", "陕西",
    "甘肃", "青海", "台湾", "内蒙古", "广西", "西藏", "宁夏", "新疆",
];

/// Exact match against the domestic list. Empty labels never match.
pub fn is_domestic(region: &str) -> bool {
    DOMESTIC_REGIONS.contains(&region)
}
