//! Simple tile-parallel render.
//!
//! Builds a small scene with static and moving spheres, a rotated box and a
//! smoke ball under a BVH, renders it tile by tile with rayon and writes a
//! PPM.
//!
//! Usage: `simple_render [settings.json] [output.ppm]`

use anyhow::Result;
use prism_renderer::{
    stats, BvhNode, Camera, Color, ConstantMedium, Cuboid, Film, HitRecord, Hittable, HittableRef,
    Interval, Material, MaterialRef, MovingSphere, Ray, RenderSettings, Rotate, ScatterResult,
    Sphere, Translate, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

const MAX_DEPTH: u32 = 10;

/// Lambertian (diffuse) material.
struct Lambertian {
    albedo: Color,
}

impl Material for Lambertian {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scatter_direction, ray_in.time),
        })
    }
}

/// Phase function for the smoke: scatters uniformly in all directions.
struct Isotropic {
    albedo: Color,
}

impl Material for Isotropic {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, random_unit_vector(rng), ray_in.time),
        })
    }
}

fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Use rejection sampling for uniform distribution on sphere
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

fn lambertian(albedo: Color) -> MaterialRef {
    Arc::new(Lambertian { albedo })
}

fn node(object: impl Into<Hittable>) -> HittableRef {
    object.into().into_ref()
}

fn build_scene(settings: &RenderSettings) -> Result<Hittable> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut objects: Vec<HittableRef> = Vec::new();

    // Ground
    objects.push(node(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        lambertian(Color::new(0.5, 0.5, 0.5)),
    )));

    // Small spheres, some bouncing during the shutter
    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(
                a as f64 + 0.9 * rng.gen::<f64>(),
                0.2,
                b as f64 + 0.9 * rng.gen::<f64>(),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() < 1.2 {
                continue;
            }

            let albedo = Color::new(
                rng.gen::<f64>() * rng.gen::<f64>(),
                rng.gen::<f64>() * rng.gen::<f64>(),
                rng.gen::<f64>() * rng.gen::<f64>(),
            );
            if rng.gen_bool(0.3) {
                let center1 = center + Vec3::new(0.0, rng.gen_range(0.0..0.5), 0.0);
                objects.push(node(MovingSphere::new(
                    center,
                    center1,
                    0.0,
                    1.0,
                    0.2,
                    lambertian(albedo),
                )?));
            } else {
                objects.push(node(Sphere::new(center, 0.2, lambertian(albedo))));
            }
        }
    }

    // Rotated box, instanced off the origin
    let crate_box = node(Cuboid::new(
        Vec3::ZERO,
        Vec3::new(1.0, 2.0, 1.0),
        lambertian(Color::new(0.4, 0.2, 0.1)),
    ));
    let rotated = node(Rotate::y(crate_box, 20.0));
    objects.push(node(Translate::new(rotated, Vec3::new(-4.5, 0.0, -0.5))));

    // Smoke ball
    let boundary = node(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        lambertian(Color::ONE),
    ));
    objects.push(node(ConstantMedium::new(
        boundary,
        1.5,
        Arc::new(Isotropic {
            albedo: Color::new(0.8, 0.8, 0.9),
        }),
    )?));

    log::info!("Created {} objects", objects.len());
    let bvh = BvhNode::new(&objects, settings.time0, settings.time1)?;
    Ok(Hittable::from(bvh))
}

/// Compute the color seen by a ray.
fn ray_color(ray: &Ray, world: &Hittable, depth: u32, rng: &mut dyn RngCore) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, Interval::new(0.001, f64::INFINITY), rng) else {
        return sky_gradient(ray);
    };

    let emission = rec.material.emitted(rec.u, rec.v, rec.p);
    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            emission + result.attenuation * ray_color(&result.scattered, world, depth - 1, rng)
        }
        None => emission,
    }
}

fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction.normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    (1.0 - a) * Color::ONE + a * Color::new(0.5, 0.7, 1.0)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => RenderSettings::load(path)?,
        None => RenderSettings::default(),
    };
    let output = args.next().unwrap_or_else(|| "output.ppm".to_string());

    let start = Instant::now();
    let world = build_scene(&settings)?;
    log::info!("Scene built in {:?}", start.elapsed());

    let mut camera = Camera::new()
        .with_position(
            Vec3::new(13.0, 2.0, 3.0), // look_from
            Vec3::new(0.0, 0.5, 0.0),  // look_at
            Vec3::new(0.0, 1.0, 0.0),  // vup
        )
        .with_lens(20.0, 0.1, 10.0)
        .with_settings(&settings);
    camera.initialize();

    let film = Film::from_settings(&settings)?;
    let (columns, _) = film.tile_grid();

    log::info!(
        "Rendering {}x{} @ {} spp",
        film.width(),
        film.height(),
        settings.samples_per_pixel
    );

    let start = Instant::now();
    film.tiles()
        .into_par_iter()
        .try_for_each(|(i, j)| -> Result<()> {
            let mut tile = film.get_film_tile(i, j)?;
            let tile_index = u64::from(j) * u64::from(columns) + u64::from(i);
            let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(tile_index));

            for local_y in 0..tile.extent_y {
                for local_x in 0..tile.extent_x {
                    let x = tile.origin_x + local_x;
                    let y = tile.origin_y + local_y;

                    for _ in 0..settings.samples_per_pixel {
                        let jitter = (rng.gen::<f64>(), rng.gen::<f64>());
                        let (s, t) = film.viewport_position(x, y, jitter);
                        let ray = camera.get_ray(s, t, &mut rng);
                        let color = ray_color(&ray, &world, MAX_DEPTH, &mut rng);
                        tile.add_sample(local_x, local_y, color);
                    }
                }
            }

            film.merge_film_tile(tile)?;
            stats::log_thread_stats();
            Ok(())
        })?;
    log::info!("Rendered in {:?}", start.elapsed());

    film.write_image(&output, settings.samples_per_pixel)?;
    Ok(())
}
