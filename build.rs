use std::cmp::Ordering;
use std::env;
use std::process::Command;

// CPU features the lane backends care about
#[derive(PartialEq, Eq, Debug)]
struct CpuFeature {
    name: &'static str,
    // name as reported in CARGO_CFG_TARGET_FEATURE
    target_feature: &'static [&'static str],
    cfg_flag: &'static str,
    detected: bool,
    enabled: bool,
}

impl CpuFeature {
    // Lowest number == Highest Priority
    fn priority(&self) -> usize {
        match self.name {
            "avx2" => 0,
            _ => usize::MAX,
        }
    }

    // The 256-bit backend needs both AVX2 (integer lanes) and FMA (fused multiply-add)
    fn features() -> Vec<CpuFeature> {
        vec![CpuFeature {
            name: "avx2",
            target_feature: &["avx2", "fma"],
            cfg_flag: "avx2",
            detected: false,
            enabled: false,
        }]
    }
}

impl Ord for CpuFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for CpuFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

trait CpuFeatureDetector {
    fn detect_features(&self, features: &mut [CpuFeature]);
    fn is_applicable(&self) -> bool;
}

struct LinuxDetector;
impl CpuFeatureDetector for LinuxDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let flags: Vec<String> = cpuinfo
                .lines()
                .filter(|line| line.starts_with("flags"))
                .flat_map(|line| line.split_whitespace().map(str::to_lowercase))
                .collect();

            for feature in features.iter_mut() {
                feature.detected = feature
                    .target_feature
                    .iter()
                    .all(|name| flags.iter().any(|flag| flag == name));
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

struct MacOSDetector;
impl CpuFeatureDetector for MacOSDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        let output = Command::new("sysctl").args(["-a"]).output();

        if let Ok(output) = output {
            let contents = String::from_utf8_lossy(&output.stdout).to_lowercase();

            for feature in features.iter_mut() {
                if feature.name == "avx2" {
                    feature.detected = contents.contains("hw.optional.avx2_0: 1")
                        && contents.contains("hw.optional.fma: 1");
                }
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "macos")
    }
}

struct PlatformDetector;
impl PlatformDetector {
    fn cpu_features_detectors() -> Vec<Box<dyn CpuFeatureDetector>> {
        vec![Box::new(LinuxDetector), Box::new(MacOSDetector)]
    }

    fn detect_cpu_features(features: &mut [CpuFeature]) {
        for detector in Self::cpu_features_detectors() {
            if detector.is_applicable() {
                detector.detect_features(features);
                break;
            }
        }
    }

    // Target features actually enabled for this compilation (e.g. via -C target-cpu=native)
    fn enabled_target_features(features: &mut [CpuFeature]) {
        let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
        let enabled = env::var("CARGO_CFG_TARGET_FEATURE").unwrap_or_default();
        let enabled: Vec<&str> = enabled.split(',').collect();

        for feature in features.iter_mut() {
            feature.enabled = arch == "x86_64"
                && feature
                    .target_feature
                    .iter()
                    .all(|name| enabled.contains(name));
        }
    }

    fn apply(features: &mut [CpuFeature]) {
        features.sort();

        // A backend is only usable when its target features are compiled in;
        // cpu detection alone would leave the intrinsics un-inlinable.
        let cfg_flag = features
            .iter()
            .find(|cpu_feature| cpu_feature.enabled)
            .map(|cpu_feature| cpu_feature.cfg_flag)
            .unwrap_or("fallback");

        for feature in features.iter() {
            if feature.detected && !feature.enabled {
                println!(
                    "cargo:warning=CPU supports {} but it is not enabled for this build; \
                     set RUSTFLAGS=\"-C target-cpu=native\" to benchmark the {} lanes",
                    feature.name, feature.cfg_flag
                );
            }
        }

        println!("cargo:rustc-cfg={cfg_flag}");

        println!("cargo::rustc-check-cfg=cfg(avx2)");
        println!("cargo::rustc-check-cfg=cfg(fallback)");
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=CARGO_ENCODED_RUSTFLAGS");

    let mut features = CpuFeature::features();

    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();

    // Only run CPU detection for native builds
    if host == target {
        PlatformDetector::detect_cpu_features(&mut features);
    }

    PlatformDetector::enabled_target_features(&mut features);
    PlatformDetector::apply(&mut features);
}
