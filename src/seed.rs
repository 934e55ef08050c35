use crate::domain::{NewCategory, NewShop};
use crate::error::Result;
use crate::storage::Storage;
use std::collections::HashMap;
use tracing::{info, warn};

struct SeedCategory {
    name: &'static str,
    description: &'static str,
}

struct SeedShop {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    seller_phone: &'static str,
    work_time: &'static str,
    location_lat: f64,
    location_long: f64,
    location_str: &'static str,
    image_urls: [&'static str; 3],
    rating: f64,
    rating_count: i64,
    like_count: i64,
    featured: bool,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory { name: "Oziq-ovqat", description: "Oziq-ovqat mahsulotlari" },
    SeedCategory { name: "Kiyim-kechak", description: "Kiyim-kechak do'konlari" },
    SeedCategory { name: "Elektronika", description: "Elektronika va gadjetlar" },
    SeedCategory { name: "Uy-ro'zg'or", description: "Uy-ro'zg'or buyumlari" },
    SeedCategory { name: "Salomatlik", description: "Dori-darmon va salomatlik" },
    SeedCategory { name: "Qurilish", description: "Qurilish materiallari" },
    SeedCategory { name: "Avtomobil", description: "Avtomobil ehtiyot qismlari" },
    SeedCategory { name: "Kitoblar", description: "Kitoblar va nashriyotlar" },
];

const SHOPS: &[SeedShop] = &[
    SeedShop {
        name: "Samarqand Non",
        description: "Eng yangi va mazali nonlar. Har kuni yangi pishiriladi.",
        category: "Oziq-ovqat",
        seller_phone: "+998901234567",
        work_time: "06:00 - 20:00",
        location_lat: 39.6542,
        location_long: 66.9597,
        location_str: "Sektor 101, Do'kon 15",
        image_urls: [
            "https://picsum.photos/seed/samarqandnon1/1600/1200",
            "https://picsum.photos/seed/samarqandnon2/1600/1200",
            "https://picsum.photos/seed/samarqandnon3/1600/1200",
        ],
        rating: 4.5,
        rating_count: 25,
        like_count: 12,
        featured: true,
    },
    SeedShop {
        name: "Moda Do'koni",
        description: "Eng zamonaviy va chiroyli kiyimlar. Katta tanlov va arzon narxlar.",
        category: "Kiyim-kechak",
        seller_phone: "+998902345678",
        work_time: "09:00 - 19:00",
        location_lat: 39.6550,
        location_long: 66.9600,
        location_str: "Sektor 203, Do'kon 42",
        image_urls: [
            "https://picsum.photos/seed/modadokoni1/1600/1200",
            "https://picsum.photos/seed/modadokoni2/1600/1200",
            "https://picsum.photos/seed/modadokoni3/1600/1200",
        ],
        rating: 4.8,
        rating_count: 45,
        like_count: 30,
        featured: true,
    },
    SeedShop {
        name: "Tech Store",
        description: "Smartfonlar, noutbuklar va boshqa elektronika. Rasmiy kafolat bilan.",
        category: "Elektronika",
        seller_phone: "+998903456789",
        work_time: "09:00 - 20:00",
        location_lat: 39.6560,
        location_long: 66.9610,
        location_str: "Sektor 102, Do'kon 78",
        image_urls: [
            "https://picsum.photos/seed/techstore1/1600/1200",
            "https://picsum.photos/seed/techstore2/1600/1200",
            "https://picsum.photos/seed/techstore3/1600/1200",
        ],
        rating: 4.7,
        rating_count: 60,
        like_count: 45,
        featured: false,
    },
    SeedShop {
        name: "Uy Ro'zg'or Markazi",
        description: "Uy uchun kerakli barcha narsalar. Idish-tovoq, mebel va boshqalar.",
        category: "Uy-ro'zg'or",
        seller_phone: "+998904567890",
        work_time: "08:00 - 18:00",
        location_lat: 39.6570,
        location_long: 66.9620,
        location_str: "Sektor 305, Do'kon 23",
        image_urls: [
            "https://picsum.photos/seed/uyrozgor1/1600/1200",
            "https://picsum.photos/seed/uyrozgor2/1600/1200",
            "https://picsum.photos/seed/uyrozgor3/1600/1200",
        ],
        rating: 4.2,
        rating_count: 18,
        like_count: 8,
        featured: false,
    },
    SeedShop {
        name: "Sog'liq Aptekasi",
        description: "Dori-darmonlar va tibbiy buyumlar. Barcha dori vositalari mavjud.",
        category: "Salomatlik",
        seller_phone: "+998905678901",
        work_time: "08:00 - 22:00",
        location_lat: 39.6580,
        location_long: 66.9630,
        location_str: "Sektor 110, Do'kon 56",
        image_urls: [
            "https://picsum.photos/seed/soglikapteka1/1600/1200",
            "https://picsum.photos/seed/soglikapteka2/1600/1200",
            "https://picsum.photos/seed/soglikapteka3/1600/1200",
        ],
        rating: 4.9,
        rating_count: 35,
        like_count: 28,
        featured: true,
    },
    SeedShop {
        name: "Qurilish Materiallari",
        description: "Uy qurish uchun barcha materiallar. Sement, g'isht, qum va boshqalar.",
        category: "Qurilish",
        seller_phone: "+998906789012",
        work_time: "07:00 - 18:00",
        location_lat: 39.6590,
        location_long: 66.9640,
        location_str: "Sektor 420, Do'kon 89",
        image_urls: [
            "https://picsum.photos/seed/qurilish1/1600/1200",
            "https://picsum.photos/seed/qurilish2/1600/1200",
            "https://picsum.photos/seed/qurilish3/1600/1200",
        ],
        rating: 4.4,
        rating_count: 22,
        like_count: 15,
        featured: false,
    },
    SeedShop {
        name: "Avto Servis",
        description: "Avtomobil ehtiyot qismlari va xizmatlar. Barcha markalar uchun.",
        category: "Avtomobil",
        seller_phone: "+998907890123",
        work_time: "08:00 - 20:00",
        location_lat: 39.6600,
        location_long: 66.9650,
        location_str: "Sektor 215, Do'kon 112",
        image_urls: [
            "https://picsum.photos/seed/avtoservis1/1600/1200",
            "https://picsum.photos/seed/avtoservis2/1600/1200",
            "https://picsum.photos/seed/avtoservis3/1600/1200",
        ],
        rating: 4.6,
        rating_count: 40,
        like_count: 25,
        featured: false,
    },
    SeedShop {
        name: "Kitoblar Olami",
        description: "O'zbek va jahon adabiyoti. Darsliklar va ilmiy kitoblar.",
        category: "Kitoblar",
        seller_phone: "+998908901234",
        work_time: "09:00 - 18:00",
        location_lat: 39.6610,
        location_long: 66.9660,
        location_str: "Sektor 130, Do'kon 34",
        image_urls: [
            "https://picsum.photos/seed/kitoblar1/1600/1200",
            "https://picsum.photos/seed/kitoblar2/1600/1200",
            "https://picsum.photos/seed/kitoblar3/1600/1200",
        ],
        rating: 4.3,
        rating_count: 15,
        like_count: 10,
        featured: false,
    },
    SeedShop {
        name: "Go'sht Do'koni",
        description: "Taza go'sht va mol go'shti. Har kuni yangi yetkazib beriladi.",
        category: "Oziq-ovqat",
        seller_phone: "+998909012345",
        work_time: "06:00 - 19:00",
        location_lat: 39.6620,
        location_long: 66.9670,
        location_str: "Sektor 307, Do'kon 67",
        image_urls: [
            "https://picsum.photos/seed/goshtdokoni1/1600/1200",
            "https://picsum.photos/seed/goshtdokoni2/1600/1200",
            "https://picsum.photos/seed/goshtdokoni3/1600/1200",
        ],
        rating: 4.5,
        rating_count: 30,
        like_count: 20,
        featured: false,
    },
    SeedShop {
        name: "Zamonaviy Kiyimlar",
        description: "Yoshlar uchun zamonaviy kiyimlar. Sport va kundalik kiyimlar.",
        category: "Kiyim-kechak",
        seller_phone: "+998900123456",
        work_time: "09:00 - 19:00",
        location_lat: 39.6630,
        location_long: 66.9680,
        location_str: "Sektor 208, Do'kon 91",
        image_urls: [
            "https://picsum.photos/seed/zamonaviy1/1600/1200",
            "https://picsum.photos/seed/zamonaviy2/1600/1200",
            "https://picsum.photos/seed/zamonaviy3/1600/1200",
        ],
        rating: 4.7,
        rating_count: 50,
        like_count: 35,
        featured: true,
    },
];

#[derive(Debug, Default)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub shops_created: usize,
    pub shops_updated: usize,
}

/// Upserts the demo categories and shops by name. Safe to run repeatedly:
/// existing shops get their listing fields refreshed while rating and like
/// counters are left alone.
pub async fn run(storage: &dyn Storage) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut category_ids: HashMap<&'static str, i64> = HashMap::new();
    for entry in CATEGORIES {
        let category = match storage.get_category_by_name(entry.name).await? {
            Some(existing) => {
                info!("Category already exists: {}", entry.name);
                existing
            }
            None => {
                let created = storage
                    .create_category(NewCategory {
                        name: entry.name.to_string(),
                        description: Some(entry.description.to_string()),
                        icon_url: None,
                    })
                    .await?;
                info!("Created category: {}", entry.name);
                summary.categories_created += 1;
                created
            }
        };
        category_ids.insert(entry.name, category.id);
    }

    for entry in SHOPS {
        let Some(&category_id) = category_ids.get(entry.category) else {
            warn!("Category not found for shop {}: {}", entry.name, entry.category);
            continue;
        };

        let image_urls: Vec<String> = entry.image_urls.iter().map(|url| url.to_string()).collect();

        if let Some(mut existing) = storage.get_shop_by_name(entry.name).await? {
            existing.description = entry.description.to_string();
            existing.category_id = category_id;
            existing.seller_phone = entry.seller_phone.to_string();
            existing.work_time = entry.work_time.to_string();
            existing.location_lat = entry.location_lat;
            existing.location_long = entry.location_long;
            existing.location_str = entry.location_str.to_string();
            existing.image_urls = image_urls;
            existing.is_featured = entry.featured;
            storage.update_shop(&existing).await?;
            info!("Updated shop: {}", entry.name);
            summary.shops_updated += 1;
            continue;
        }

        storage
            .create_shop(NewShop {
                name: entry.name.to_string(),
                work_time: entry.work_time.to_string(),
                description: entry.description.to_string(),
                category_id,
                seller_phone: entry.seller_phone.to_string(),
                image_urls,
                rating: entry.rating,
                rating_count: entry.rating_count,
                like_count: entry.like_count,
                location_lat: entry.location_lat,
                location_long: entry.location_long,
                location_str: entry.location_str.to_string(),
                is_featured: entry.featured,
                expiration_months: 12,
            })
            .await?;
        info!("Created shop: {}", entry.name);
        summary.shops_created += 1;
    }

    Ok(summary)
}
