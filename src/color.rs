/// A random hue, dark enough that white text stays readable on top of it.
pub fn generate_dark_color() -> String {
    let hue: u16 = rand::random_range(0..360);
    format!("hsl({hue}, 60%, 35%)")
}
