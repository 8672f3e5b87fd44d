//! Prompt construction for a single turn

/// Phrases that mark a question as being about the service itself
const SERVICE_KEYWORDS: &[&str] = &[
    "layanan", "service", "produk", "product", "harga", "price", "biaya", "cost", "tarif",
    "kontak", "contact", "hubungi", "email", "telepon", "phone", "alamat", "address",
    "perusahaan", "company", "bisnis", "business", "tim", "team", "staff",
    "portfolio", "project", "klien", "client", "customer", "pelanggan",
    "website", "web", "online", "digital", "teknologi perusahaan", "company tech",
    "cara pesan", "cara order", "how to order", "booking", "appointment",
    "jam kerja", "working hours", "operasional", "operational",
    "pembayaran", "payment", "invoice", "billing", "quote", "penawaran",
    "support", "bantuan teknis", "technical support", "help desk",
    "tentang kami", "about us", "profil perusahaan", "company profile",
    "lokasi", "location", "kantor", "office", "cabang", "branch",
];

/// Whether `utterance` asks about the service rather than general knowledge
#[must_use]
pub fn is_service_query(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    SERVICE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Build the model prompt for one utterance
///
/// Service questions are answered in 2-3 sentences, with the context block
/// when one is supplied. Everything else gets a 3-4 sentence limit.
#[must_use]
pub fn build_prompt(utterance: &str, context: &str) -> String {
    let context = context.trim();

    if !is_service_query(utterance) {
        return format!(
            "Pertanyaan: {utterance}\n\n\
             Instruksi: Berikan jawaban yang singkat dan jelas (maksimal 3-4 kalimat). \
             Langsung ke poin utama tanpa penjelasan panjang. \
             Gunakan bahasa Indonesia yang mudah dipahami."
        );
    }

    if context.is_empty() {
        format!(
            "Pertanyaan terkait website/layanan: {utterance}\n\n\
             Instruksi: Berikan jawaban singkat dan profesional (maksimal 2-3 kalimat). \
             Fokus pada informasi inti saja. Gunakan bahasa Indonesia yang ramah."
        )
    } else {
        format!(
            "Konteks website: {context}\n\n\
             Pertanyaan: {utterance}\n\n\
             Instruksi: Jawab pertanyaan dengan singkat dan jelas (maksimal 2-3 kalimat). \
             Berikan informasi yang paling penting saja. Gunakan bahasa Indonesia yang ramah."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_queries_detected() {
        assert!(is_service_query("Di mana LOKASI kantor?"));
        assert!(is_service_query("berapa harga langganan"));
        assert!(!is_service_query("apa itu fotosintesis"));
    }

    #[test]
    fn service_query_with_context() {
        let prompt = build_prompt("jam operasional?", "Platform: CCTV");
        assert!(prompt.starts_with("Konteks website: Platform: CCTV"));
        assert!(prompt.contains("Pertanyaan: jam operasional?"));
        assert!(prompt.contains("maksimal 2-3 kalimat"));
    }

    #[test]
    fn service_query_without_context() {
        let prompt = build_prompt("kontak support", "   ");
        assert!(prompt.starts_with("Pertanyaan terkait website/layanan: kontak support"));
        assert!(prompt.contains("maksimal 2-3 kalimat"));
    }

    #[test]
    fn general_query_ignores_context() {
        let prompt = build_prompt("apa itu fotosintesis", "Platform: CCTV");
        assert!(!prompt.contains("Konteks"));
        assert!(prompt.contains("maksimal 3-4 kalimat"));
    }
}
