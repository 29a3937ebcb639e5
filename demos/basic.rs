use colorthief::image::io::Reader as ImageReader;

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "photo.jpg".to_string());
    let reader = ImageReader::open(path).unwrap();
    let img = reader.decode().unwrap();
    let buf = img.to_rgba8();

    let palette = colorthief::Palette::from_image(buf)
        .max_cubes(8)
        .generate()
        .unwrap();

    for swatch in palette.sorted_by_population() {
        println!("{} {}", swatch.hex(), swatch.population());
    }
}
