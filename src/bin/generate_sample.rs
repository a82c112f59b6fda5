use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// One generated product row.
struct Phone {
    name: String,
    brand: String,
    price: i64,
    rating: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`.
    fn range(&mut self, low: i64, high: i64) -> i64 {
        low + (self.next_f64() * (high - low) as f64) as i64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.range(0, items.len() as i64) as usize]
    }
}

/// The four reference phones, then `extra` generated ones.
fn phones(extra: usize, rng: &mut SimpleRng) -> Vec<Phone> {
    let mut out: Vec<Phone> = [
        ("iphone 15 pro", "apple", 999, 4.9),
        ("galaxy s23 ultra", "samsung", 1199, 4.8),
        ("redmi note 12", "xiaomi", 199, 4.6),
        ("poco x5 pro", "xiaomi", 299, 4.4),
    ]
    .into_iter()
    .map(|(name, brand, price, rating)| Phone {
        name: name.to_string(),
        brand: brand.to_string(),
        price,
        rating,
    })
    .collect();

    let brands = ["apple", "samsung", "xiaomi", "google", "oneplus"];
    let models = ["lite", "plus", "pro", "ultra", "mini"];
    for i in 0..extra {
        let brand = rng.pick(&brands);
        let model = rng.pick(&models);
        // One decimal place, 3.5 ..= 5.0
        let rating = rng.range(35, 51) as f64 / 10.0;
        out.push(Phone {
            name: format!("{brand} {model} {}", i + 1),
            brand: brand.to_string(),
            price: rng.range(99, 1500),
            rating,
        });
    }
    out
}

fn write_csv(path: &str, phones: &[Phone]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["name", "brand", "price", "rating"])?;
    for p in phones {
        writer.write_record([
            p.name.clone(),
            p.brand.clone(),
            p.price.to_string(),
            p.rating.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, phones: &[Phone]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("brand", DataType::Utf8, false),
        Field::new("price", DataType::Int64, false),
        Field::new("rating", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(phones.iter().map(|p| &p.name))),
            Arc::new(StringArray::from_iter_values(phones.iter().map(|p| &p.brand))),
            Arc::new(Int64Array::from_iter_values(phones.iter().map(|p| p.price))),
            Arc::new(Float64Array::from_iter_values(phones.iter().map(|p| p.rating))),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let phones = phones(46, &mut rng);

    write_csv("sample_data.csv", &phones)?;
    write_parquet("sample_data.parquet", &phones)?;
    log::info!("wrote sample_data.csv and sample_data.parquet");

    println!(
        "Wrote {} phones to sample_data.csv and sample_data.parquet",
        phones.len()
    );
    Ok(())
}
