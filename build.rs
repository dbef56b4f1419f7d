fn main() {
    // Only the device build needs the ESP-IDF environment; host builds and
    // tests compile without it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
